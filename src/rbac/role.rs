use super::permission::Permission;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform roles.
///
/// Roles form a strict rank order used by the impersonation predicate:
/// `SuperAdmin > Admin > User`. A principal without any role ranks below
/// `User`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

/// Rank of a principal holding no role at all.
pub const UNRANKED: u8 = 0;

impl Role {
    /// Every role, highest rank first.
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::User];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Position in the rank order (higher = more privileged).
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::SuperAdmin => 3,
            Self::Admin => 2,
            Self::User => 1,
        }
    }

    /// Check if this role ranks strictly above another.
    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        self.rank() > other.rank()
    }

    /// Permissions granted to this role.
    ///
    /// This table is what `sync_grants` writes to the grant store.
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;

        match self {
            Self::SuperAdmin => &Permission::ALL,
            Self::Admin => &[
                ViewUsers,
                CreateUsers,
                UpdateUsers,
                DeleteUsers,
                ImpersonateUsers,
                ViewRoles,
                ViewClients,
                ManageClients,
                ViewActivityLog,
                ManageTasks,
                ViewEmailAnalytics,
                ManageBranding,
            ],
            Self::User => &[ManageTasks],
        }
    }

    /// Check if this role grants a permission.
    #[must_use]
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role: '{}' (expected: super_admin, admin, or user)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
