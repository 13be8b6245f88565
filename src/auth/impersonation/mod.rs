//! Admin impersonation for user support.
//!
//! An authorized administrator temporarily acts as another user. The
//! impersonation record lives in the web session under one key and every
//! start and leave is written to the activity log.
//!
//! # Example
//!
//! ```rust,ignore
//! use overseer::auth::impersonation::{ImpersonationConfig, ImpersonationService};
//!
//! let service = ImpersonationService::new(sessions, principals, activity, ImpersonationConfig::default());
//!
//! let started = service.start(&session_id, "user-456", Some("/users"), &meta).await?;
//! // ... the session now authenticates as user-456 ...
//! let left = service.leave(&session_id, &meta).await?;
//! ```

mod config;
pub mod policy;
pub mod state;
mod service;

pub use config::ImpersonationConfig;
pub use policy::{DenialReason, ImpersonationAffordance, affordance, can_impersonate};
pub use service::{ImpersonationService, LeaveOutcome, StartOutcome};
pub use state::{ImpersonationSession, ImpersonationState};
