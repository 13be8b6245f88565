//! Test fixtures for principals and fake data.

use uuid::Uuid;

use crate::identity::{Principal, PrincipalStatus};
use crate::rbac::{Permission, Role};

/// Helper functions for generating fake test data
pub mod fake {
    use super::*;

    /// Generate a fake email address
    pub fn email() -> String {
        format!("test-{}@example.com", Uuid::new_v4().simple())
    }

    /// Generate a fake UUID as a string
    pub fn uuid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a fake name
    pub fn name() -> String {
        format!("Test User {}", &Uuid::new_v4().simple().to_string()[..8])
    }

    /// Generate a fake IPv4 address in the documentation range
    pub fn ip() -> String {
        format!("203.0.113.{}", fastrand::u8(1..=254))
    }

    /// Generate a random string of the given length
    pub fn string(length: usize) -> String {
        (0..length).map(|_| fastrand::alphabetic()).collect()
    }
}

/// Builder for test principals with generated defaults
#[derive(Debug, Clone)]
pub struct TestPrincipal {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    status: PrincipalStatus,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
}

impl TestPrincipal {
    pub fn builder() -> Self {
        Self {
            id: None,
            name: None,
            email: None,
            status: PrincipalStatus::Active,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn super_admin() -> Self {
        Self::builder().with_role(Role::SuperAdmin)
    }

    pub fn admin() -> Self {
        Self::builder().with_role(Role::Admin)
    }

    pub fn user() -> Self {
        Self::builder().with_role(Role::User)
    }

    /// A principal with generated values and no roles
    pub fn generate() -> Principal {
        Self::builder().build()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: PrincipalStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Grant a permission directly, outside any role
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn build(self) -> Principal {
        let mut principal = Principal::new(
            self.id.unwrap_or_else(fake::uuid),
            self.name.unwrap_or_else(fake::name),
        )
        .with_email(self.email.unwrap_or_else(fake::email))
        .with_status(self.status);

        for role in self.roles {
            principal = principal.with_role(role);
        }
        for permission in self.permissions {
            principal = principal.with_permission(permission);
        }

        principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_email() {
        let email = fake::email();
        assert!(email.contains("@example.com"));
        assert!(email.starts_with("test-"));
    }

    #[test]
    fn test_fake_uuid() {
        let uuid1 = fake::uuid();
        let uuid2 = fake::uuid();
        assert_ne!(uuid1, uuid2);
        assert_eq!(uuid1.len(), 36);
    }

    #[test]
    fn test_role_presets() {
        let admin = TestPrincipal::admin().with_name("Ada").build();
        assert_eq!(admin.name, "Ada");
        assert_eq!(admin.rank(), Role::Admin.rank());
        assert!(admin.has_permission(Permission::ImpersonateUsers));

        let user = TestPrincipal::user().build();
        assert!(!user.has_permission(Permission::ImpersonateUsers));
        assert!(user.is_active());
    }

    #[test]
    fn test_direct_permission_and_status() {
        let p = TestPrincipal::builder()
            .with_permission(Permission::ViewUsers)
            .with_status(PrincipalStatus::Suspended)
            .build();
        assert!(p.has_permission(Permission::ViewUsers));
        assert!(!p.is_active());
    }
}
