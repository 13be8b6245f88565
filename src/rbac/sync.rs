//! Reconciliation of the compiled role/permission table into the grant store.
//!
//! Run at startup or deploy time. Request handling never reads the grant
//! store; it relies on [`Role::permissions`] directly.

use super::permission::Permission;
use super::role::Role;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

/// Persisted grant store (permissions, roles, and role→permission links).
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// All permission names currently stored.
    async fn list_permissions(&self) -> Result<Vec<String>>;

    /// Insert a permission.
    async fn create_permission(&self, name: &str) -> Result<()>;

    /// Delete a permission and every role link that references it.
    async fn delete_permission(&self, name: &str) -> Result<()>;

    /// All role names currently stored.
    async fn list_roles(&self) -> Result<Vec<String>>;

    /// Insert a role.
    async fn create_role(&self, name: &str) -> Result<()>;

    /// Permission names linked to a role.
    async fn role_permissions(&self, role: &str) -> Result<Vec<String>>;

    /// Replace the permission links of a role.
    async fn set_role_permissions(&self, role: &str, permissions: &[String]) -> Result<()>;
}

/// What a sync run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub permissions_created: Vec<String>,
    pub permissions_removed: Vec<String>,
    pub roles_created: Vec<String>,
    pub roles_updated: Vec<String>,
}

impl SyncReport {
    /// True when the store already matched the compiled table.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.permissions_created.is_empty()
            && self.permissions_removed.is_empty()
            && self.roles_created.is_empty()
            && self.roles_updated.is_empty()
    }
}

/// Bring the grant store in line with [`Permission::ALL`] and [`Role::ALL`].
///
/// Idempotent. Roles unknown to the compiled table are left in place.
pub async fn sync_grants<G: GrantStore + ?Sized>(store: &G) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let wanted: BTreeSet<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
    let existing: BTreeSet<String> = store.list_permissions().await?.into_iter().collect();

    for name in &wanted {
        if !existing.contains(*name) {
            store.create_permission(name).await?;
            report.permissions_created.push(name.to_string());
        }
    }

    for name in &existing {
        if !wanted.contains(name.as_str()) {
            store.delete_permission(name).await?;
            report.permissions_removed.push(name.clone());
        }
    }

    let existing_roles: BTreeSet<String> = store.list_roles().await?.into_iter().collect();

    for role in Role::ALL {
        if !existing_roles.contains(role.as_str()) {
            store.create_role(role.as_str()).await?;
            report.roles_created.push(role.as_str().to_string());
        }

        let want: BTreeSet<String> = role
            .permissions()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        let have: BTreeSet<String> = store
            .role_permissions(role.as_str())
            .await?
            .into_iter()
            .collect();

        if want != have {
            let links: Vec<String> = want.into_iter().collect();
            store.set_role_permissions(role.as_str(), &links).await?;
            report.roles_updated.push(role.as_str().to_string());
        }
    }

    for name in existing_roles
        .iter()
        .filter(|r| r.parse::<Role>().is_err())
    {
        tracing::warn!(
            target: "overseer.rbac.sync",
            role = %name,
            "Stored role has no compiled counterpart; leaving it untouched"
        );
    }

    tracing::info!(
        target: "overseer.rbac.sync",
        permissions_created = report.permissions_created.len(),
        permissions_removed = report.permissions_removed.len(),
        roles_created = report.roles_created.len(),
        roles_updated = report.roles_updated.len(),
        "Grant store synchronized"
    );

    Ok(report)
}

mod in_memory {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use tokio::sync::RwLock;

    /// In-memory grant store.
    #[derive(Default)]
    pub struct InMemoryGrantStore {
        permissions: RwLock<BTreeSet<String>>,
        roles: RwLock<BTreeMap<String, BTreeSet<String>>>,
    }

    impl InMemoryGrantStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl GrantStore for InMemoryGrantStore {
        async fn list_permissions(&self) -> Result<Vec<String>> {
            Ok(self.permissions.read().await.iter().cloned().collect())
        }

        async fn create_permission(&self, name: &str) -> Result<()> {
            self.permissions.write().await.insert(name.to_string());
            Ok(())
        }

        async fn delete_permission(&self, name: &str) -> Result<()> {
            self.permissions.write().await.remove(name);
            for links in self.roles.write().await.values_mut() {
                links.remove(name);
            }
            Ok(())
        }

        async fn list_roles(&self) -> Result<Vec<String>> {
            Ok(self.roles.read().await.keys().cloned().collect())
        }

        async fn create_role(&self, name: &str) -> Result<()> {
            self.roles
                .write()
                .await
                .entry(name.to_string())
                .or_default();
            Ok(())
        }

        async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
            Ok(self
                .roles
                .read()
                .await
                .get(role)
                .map(|links| links.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn set_role_permissions(&self, role: &str, permissions: &[String]) -> Result<()> {
            self.roles
                .write()
                .await
                .insert(role.to_string(), permissions.iter().cloned().collect());
            Ok(())
        }
    }
}

pub use in_memory::InMemoryGrantStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_into_empty_store() {
        let store = InMemoryGrantStore::new();
        let report = sync_grants(&store).await.unwrap();

        assert_eq!(report.permissions_created.len(), Permission::ALL.len());
        assert_eq!(report.roles_created.len(), Role::ALL.len());
        assert!(report.permissions_removed.is_empty());

        let admin = store.role_permissions("admin").await.unwrap();
        assert!(admin.contains(&"users.impersonate".to_string()));
        assert!(!admin.contains(&"roles.manage".to_string()));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = InMemoryGrantStore::new();
        sync_grants(&store).await.unwrap();

        let second = sync_grants(&store).await.unwrap();
        assert!(second.is_noop());
    }

    #[tokio::test]
    async fn test_sync_removes_stale_and_repairs_links() {
        let store = InMemoryGrantStore::new();
        sync_grants(&store).await.unwrap();

        store.create_permission("legacy.export").await.unwrap();
        store
            .set_role_permissions(
                "user",
                &["legacy.export".to_string(), "users.impersonate".to_string()],
            )
            .await
            .unwrap();

        let report = sync_grants(&store).await.unwrap();
        assert_eq!(report.permissions_removed, vec!["legacy.export".to_string()]);
        assert_eq!(report.roles_updated, vec!["user".to_string()]);

        let user = store.role_permissions("user").await.unwrap();
        assert_eq!(user, vec!["tasks.manage".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_roles_are_kept() {
        let store = InMemoryGrantStore::new();
        store.create_role("auditor").await.unwrap();

        sync_grants(&store).await.unwrap();

        let roles = store.list_roles().await.unwrap();
        assert!(roles.contains(&"auditor".to_string()));
    }
}
