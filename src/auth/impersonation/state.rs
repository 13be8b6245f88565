//! Session-side impersonation state.
//!
//! The record lives as JSON under a single session key. These functions only
//! edit a [`SessionData`] in memory; committing it is up to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::session::SessionData;

/// The impersonation record kept in the web session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationSession {
    pub is_impersonating: bool,
    /// The principal who started impersonating.
    pub original_user_id: String,
    /// Where leaving sends the browser.
    pub return_url: String,
    /// Lets the impersonated session skip a second-factor prompt.
    pub can_bypass_two_factor: bool,
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
}

/// Where a session sits in the impersonation lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpersonationState {
    Idle,
    Impersonating(ImpersonationSession),
}

impl ImpersonationState {
    pub fn is_impersonating(&self) -> bool {
        matches!(self, Self::Impersonating(_))
    }
}

/// Read the record under `key`.
///
/// # Errors
///
/// Returns the decode error when the stored value is not a valid record.
pub fn read(data: &SessionData, key: &str) -> Result<ImpersonationState, serde_json::Error> {
    match data.get(key) {
        None => Ok(ImpersonationState::Idle),
        Some(raw) => {
            let record: ImpersonationSession = serde_json::from_str(raw)?;
            Ok(if record.is_impersonating {
                ImpersonationState::Impersonating(record)
            } else {
                ImpersonationState::Idle
            })
        }
    }
}

/// Store the record and switch the authenticated principal to `target_id`.
///
/// # Errors
///
/// Only fails if the record cannot be serialized.
pub fn enter(
    data: &mut SessionData,
    key: &str,
    original_user_id: &str,
    target_id: &str,
    return_url: &str,
) -> Result<ImpersonationSession, serde_json::Error> {
    let record = ImpersonationSession {
        is_impersonating: true,
        original_user_id: original_user_id.to_string(),
        return_url: return_url.to_string(),
        can_bypass_two_factor: true,
        started_at: Utc::now(),
    };

    data.set(key.to_string(), serde_json::to_string(&record)?);
    data.set_principal(target_id);
    Ok(record)
}

/// Drop the record and switch back to the original principal.
pub fn exit(data: &mut SessionData, key: &str, original_user_id: &str) {
    data.remove(key);
    data.set_principal(original_user_id);
}

/// Drop the record and log the session out entirely.
pub fn abandon(data: &mut SessionData, key: &str) {
    data.remove(key);
    data.clear_principal();
}
