//! Principals and the identity store.
//!
//! Applications plug their user table in by implementing [`PrincipalStore`].

use crate::error::Result;
use crate::pagination::{PaginatedResult, default_page, default_per_page};
use crate::rbac::{Permission, Role, UNRANKED};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account status of a principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Deleted,
}

impl PrincipalStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

/// Error returned when parsing a status string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid_value: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status: '{}' (expected: active, inactive, suspended, or deleted)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for PrincipalStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            "deleted" => Ok(Self::Deleted),
            _ => Err(ParseStatusError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PrincipalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticatable user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub status: PrincipalStatus,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Direct grants on top of what the roles carry.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Create an active principal with no roles.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            status: PrincipalStatus::Active,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: PrincipalStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self
    }

    /// Rank of the highest role held, or [`UNRANKED`].
    #[must_use]
    pub fn rank(&self) -> u8 {
        self.roles.iter().map(Role::rank).max().unwrap_or(UNRANKED)
    }

    /// Check a permission against direct grants and every held role.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission) || self.roles.iter().any(|r| r.grants(permission))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(needle))
    }
}

/// Parameters for listing principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersParams {
    /// Matches name or email, case-insensitive.
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ListUsersParams {
    fn default() -> Self {
        Self {
            search: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Lookup of principals by id.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>>;

    /// List principals ordered by name.
    async fn list(&self, params: ListUsersParams) -> Result<PaginatedResult<Principal>>;
}

mod in_memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory principal store.
    #[derive(Clone, Default)]
    pub struct InMemoryPrincipalStore {
        principals: Arc<RwLock<HashMap<String, Principal>>>,
    }

    impl InMemoryPrincipalStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Insert or replace a principal.
        pub async fn insert(&self, principal: Principal) {
            self.principals
                .write()
                .await
                .insert(principal.id.clone(), principal);
        }

        pub async fn remove(&self, id: &str) -> Option<Principal> {
            self.principals.write().await.remove(id)
        }
    }

    #[async_trait]
    impl PrincipalStore for InMemoryPrincipalStore {
        async fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
            Ok(self.principals.read().await.get(id).cloned())
        }

        async fn list(&self, params: ListUsersParams) -> Result<PaginatedResult<Principal>> {
            let needle = params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase);

            let mut all: Vec<Principal> = self
                .principals
                .read()
                .await
                .values()
                .filter(|p| needle.as_deref().is_none_or(|n| p.matches(n)))
                .cloned()
                .collect();
            all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

            Ok(PaginatedResult::from_vec(all, params.page, params.per_page))
        }
    }
}

pub use in_memory::InMemoryPrincipalStore;
