//! Append-only activity trail.
//!
//! [`ActivityLogger`] writes records, an [`AuditStore`] keeps them and the
//! [`Translator`] turns their stored template keys into readable text when
//! they are displayed.
//!
//! ```rust,ignore
//! use overseer::audit::{ActivityEvent, ActivityLogger, InMemoryAuditStore, NewActivity};
//!
//! let logger = ActivityLogger::new(Arc::new(InMemoryAuditStore::new()), "activity");
//! logger
//!     .record(
//!         NewActivity::new("users", ActivityEvent::UserDeleted)
//!             .caused_by(&admin)
//!             .performed_on(&user)
//!             .with_property("user", serde_json::json!({"name": user.name})),
//!         &meta,
//!     )
//!     .await?;
//! ```

mod config;
mod event;
pub mod properties;
mod query;
mod storage;
pub mod translator;
mod writer;

#[cfg(feature = "database")]
mod sea_orm_store;

pub use config::AuditConfig;
pub use event::{ActivityEvent, AuditEvent, EntityRef, NewActivity};
pub use properties::shallow_merge;
pub use query::AuditQuery;
pub use storage::{AuditStore, InMemoryAuditStore};
pub use translator::Translator;
pub use writer::ActivityLogger;

#[cfg(feature = "database")]
pub use sea_orm_store::SeaOrmAuditStore;
