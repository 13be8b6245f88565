//! SeaORM-backed grant storage.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE permissions (
//!     name VARCHAR(100) PRIMARY KEY
//! );
//!
//! CREATE TABLE roles (
//!     name VARCHAR(50) PRIMARY KEY
//! );
//!
//! CREATE TABLE role_permissions (
//!     role VARCHAR(50) NOT NULL,
//!     permission VARCHAR(100) NOT NULL,
//!     PRIMARY KEY (role, permission),
//!     FOREIGN KEY (role) REFERENCES roles(name) ON DELETE CASCADE,
//!     FOREIGN KEY (permission) REFERENCES permissions(name) ON DELETE CASCADE
//! );
//! ```

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::sync::GrantStore;
use crate::error::{OverseerError, Result};

mod entity {
    use sea_orm::entity::prelude::*;

    pub mod permission {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "permissions")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod role {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "roles")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod role_permission {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "role_permissions")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub role: String,
            #[sea_orm(primary_key, auto_increment = false)]
            pub permission: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::{permission, role, role_permission};

fn db_err(e: sea_orm::DbErr) -> OverseerError {
    OverseerError::Database(e.to_string())
}

/// SeaORM-backed [`GrantStore`].
#[derive(Clone, Debug)]
pub struct SeaOrmGrantStore {
    db: DatabaseConnection,
}

impl SeaOrmGrantStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl GrantStore for SeaOrmGrantStore {
    async fn list_permissions(&self) -> Result<Vec<String>> {
        let rows = permission::Entity::find()
            .order_by_asc(permission::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|m| m.name).collect())
    }

    async fn create_permission(&self, name: &str) -> Result<()> {
        tracing::debug!(permission = %name, "creating permission");

        permission::Entity::insert(permission::ActiveModel {
            name: Set(name.to_string()),
        })
        .exec(&self.db)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_permission(&self, name: &str) -> Result<()> {
        tracing::debug!(permission = %name, "deleting permission");

        let txn = self.db.begin().await.map_err(db_err)?;

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::Permission.eq(name))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        permission::Entity::delete_by_id(name.to_string())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<String>> {
        let rows = role::Entity::find()
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|m| m.name).collect())
    }

    async fn create_role(&self, name: &str) -> Result<()> {
        tracing::debug!(role = %name, "creating role");

        role::Entity::insert(role::ActiveModel {
            name: Set(name.to_string()),
        })
        .exec(&self.db)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn role_permissions(&self, role_name: &str) -> Result<Vec<String>> {
        let rows = role_permission::Entity::find()
            .filter(role_permission::Column::Role.eq(role_name))
            .order_by_asc(role_permission::Column::Permission)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|m| m.permission).collect())
    }

    async fn set_role_permissions(&self, role_name: &str, permissions: &[String]) -> Result<()> {
        tracing::debug!(
            role = %role_name,
            count = permissions.len(),
            "replacing role permissions"
        );

        let txn = self.db.begin().await.map_err(db_err)?;

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::Role.eq(role_name))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if !permissions.is_empty() {
            let links = permissions.iter().map(|p| role_permission::ActiveModel {
                role: Set(role_name.to_string()),
                permission: Set(p.clone()),
            });

            role_permission::Entity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}
