use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capabilities known to the platform.
///
/// The string form is the stable identifier persisted in the grant store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Permission {
    ViewUsers,
    CreateUsers,
    UpdateUsers,
    DeleteUsers,
    /// Start an impersonation session as another user.
    ImpersonateUsers,
    ViewRoles,
    ManageRoles,
    ViewClients,
    ManageClients,
    ViewActivityLog,
    ManageTasks,
    ViewEmailAnalytics,
    ManageBranding,
    ManageTranslations,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 14] = [
        Permission::ViewUsers,
        Permission::CreateUsers,
        Permission::UpdateUsers,
        Permission::DeleteUsers,
        Permission::ImpersonateUsers,
        Permission::ViewRoles,
        Permission::ManageRoles,
        Permission::ViewClients,
        Permission::ManageClients,
        Permission::ViewActivityLog,
        Permission::ManageTasks,
        Permission::ViewEmailAnalytics,
        Permission::ManageBranding,
        Permission::ManageTranslations,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewUsers => "users.view",
            Self::CreateUsers => "users.create",
            Self::UpdateUsers => "users.update",
            Self::DeleteUsers => "users.delete",
            Self::ImpersonateUsers => "users.impersonate",
            Self::ViewRoles => "roles.view",
            Self::ManageRoles => "roles.manage",
            Self::ViewClients => "clients.view",
            Self::ManageClients => "clients.manage",
            Self::ViewActivityLog => "activity.view",
            Self::ManageTasks => "tasks.manage",
            Self::ViewEmailAnalytics => "email_analytics.view",
            Self::ManageBranding => "branding.manage",
            Self::ManageTranslations => "translations.manage",
        }
    }
}

/// Error returned when parsing a permission string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePermissionError {
    invalid_value: String,
}

impl fmt::Display for ParsePermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission: '{}'", self.invalid_value)
    }
}

impl std::error::Error for ParsePermissionError {}

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParsePermissionError {
                invalid_value: s.to_string(),
            })
    }
}

impl TryFrom<String> for Permission {
    type Error = ParsePermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
