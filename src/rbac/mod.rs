//! Roles, permissions and the grant-store reconciler.
//!
//! The role → permission table is compiled into the binary. [`sync_grants`]
//! mirrors it into a persisted [`GrantStore`] for reporting and external
//! tooling.

mod permission;
mod role;
mod sync;

#[cfg(feature = "database")]
mod sea_orm_store;

pub use permission::{ParsePermissionError, Permission};
pub use role::{ParseRoleError, Role, UNRANKED};
pub use sync::{GrantStore, InMemoryGrantStore, SyncReport, sync_grants};

#[cfg(feature = "database")]
pub use sea_orm_store::SeaOrmGrantStore;
