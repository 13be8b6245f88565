use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::identity::Principal;

/// Event keys the platform records.
///
/// Stores accept any key; this enum names the ones the crate itself emits or
/// ships descriptions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ActivityEvent {
    ImpersonateStart,
    ImpersonateLeave,
    AuthFailed,
    RolesSynced,
    UserCreated,
    UserUpdated,
    UserDeleted,
    ClientCreated,
    ClientUpdated,
    ClientDeleted,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 10] = [
        ActivityEvent::ImpersonateStart,
        ActivityEvent::ImpersonateLeave,
        ActivityEvent::AuthFailed,
        ActivityEvent::RolesSynced,
        ActivityEvent::UserCreated,
        ActivityEvent::UserUpdated,
        ActivityEvent::UserDeleted,
        ActivityEvent::ClientCreated,
        ActivityEvent::ClientUpdated,
        ActivityEvent::ClientDeleted,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImpersonateStart => "impersonate.start",
            Self::ImpersonateLeave => "impersonate.leave",
            Self::AuthFailed => "auth.failed",
            Self::RolesSynced => "roles.synced",
            Self::UserCreated => "user.created",
            Self::UserUpdated => "user.updated",
            Self::UserDeleted => "user.deleted",
            Self::ClientCreated => "client.created",
            Self::ClientUpdated => "client.updated",
            Self::ClientDeleted => "client.deleted",
        }
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown activity event: '{s}'"))
    }
}

impl TryFrom<String> for ActivityEvent {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActivityEvent> for String {
    fn from(value: ActivityEvent) -> Self {
        value.as_str().to_string()
    }
}

/// Typed pointer at a record in some other store (`user:42`, `client:7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new("user", id)
    }
}

impl From<&Principal> for EntityRef {
    fn from(p: &Principal) -> Self {
        Self::user(p.id.clone())
    }
}

/// A stored activity record. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    /// Category, e.g. `impersonation`.
    pub log_name: String,
    pub event: String,
    /// Template key for the translator, not rendered text.
    pub description: String,
    pub subject: Option<EntityRef>,
    pub causer: Option<EntityRef>,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Look up a dotted path (`issuer.name`) in the property bag.
    pub fn property(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.properties, |v, segment| v.get(segment))
    }
}

/// An activity about to be recorded.
///
/// Built by callers and handed to [`ActivityLogger::record`](super::ActivityLogger::record).
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub log_name: String,
    pub event: String,
    pub causer: Option<Principal>,
    pub subject: Option<EntityRef>,
    pub properties: Map<String, Value>,
}

impl NewActivity {
    pub fn new(log_name: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            log_name: log_name.into(),
            event: event.into(),
            causer: None,
            subject: None,
            properties: Map::new(),
        }
    }

    #[must_use]
    pub fn caused_by(mut self, causer: &Principal) -> Self {
        self.causer = Some(causer.clone());
        self
    }

    #[must_use]
    pub fn performed_on(mut self, subject: impl Into<EntityRef>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties.extend(properties);
        self
    }
}
