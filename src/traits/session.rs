//! Session storage trait
//!
//! This trait abstracts the web session store so that the impersonation
//! transitions receive it as an explicit capability instead of reaching for
//! ambient request state.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Session key holding the authenticated principal's id.
pub const PRINCIPAL_KEY: &str = "auth.principal_id";

/// Session data stored in the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Session data as key-value pairs
    pub data: HashMap<String, String>,

    /// When the session was created
    pub created_at: SystemTime,

    /// When the session expires
    pub expires_at: SystemTime,

    /// Write version, owned by the store.
    ///
    /// Every successful write stores exactly the previous version plus one,
    /// whatever value the caller passed in. A caller that committed with
    /// `compare_and_save(.., expected)` can therefore write again on top of
    /// its own commit with `expected + 1`. Two transitions racing on the same
    /// session cannot both commit.
    #[serde(default)]
    pub version: u64,
}

impl SessionData {
    /// Create a new session with expiration
    pub fn new(ttl: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            data: HashMap::new(),
            created_at: now,
            expires_at: now + ttl,
            version: 0,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }

    /// Get a value from the session
    pub fn get(&self, key: &str) -> Option<&String> {
        self.data.get(key)
    }

    /// Check whether a key is present
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Set a value in the session
    pub fn set(&mut self, key: String, value: String) {
        self.data.insert(key, value);
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    /// Extend the session expiration
    pub fn extend(&mut self, ttl: Duration) {
        self.expires_at = SystemTime::now() + ttl;
    }

    /// Id of the currently authenticated principal, if any.
    pub fn principal_id(&self) -> Option<&str> {
        self.get(PRINCIPAL_KEY).map(String::as_str)
    }

    /// Replace the authenticated principal without credential checks.
    pub fn set_principal(&mut self, principal_id: impl Into<String>) {
        self.set(PRINCIPAL_KEY.to_string(), principal_id.into());
    }

    /// Drop the authenticated principal.
    pub fn clear_principal(&mut self) -> Option<String> {
        self.remove(PRINCIPAL_KEY)
    }
}

/// Session storage trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load session data by session ID
    ///
    /// Returns `Ok(None)` if the session doesn't exist or has expired.
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>>;

    /// Save session data with a session ID
    ///
    /// Stores `version` as the stored version plus one, or `1` for a new session.
    async fn save(&self, session_id: &str, data: SessionData) -> Result<()>;

    /// Save only if the stored version still equals `expected_version`.
    ///
    /// Returns `Ok(false)` on a version mismatch or when the session is gone.
    /// On success the stored version is exactly `expected_version + 1`.
    /// Implementations must perform the check and the write atomically.
    ///
    /// The default implementation is NOT atomic (load then save) and exists
    /// for simple stores only.
    async fn compare_and_save(
        &self,
        session_id: &str,
        data: SessionData,
        expected_version: u64,
    ) -> Result<bool> {
        match self.load(session_id).await? {
            Some(current) if current.version == expected_version => {
                self.save(session_id, data).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Delete a session
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Check if the session store is healthy
    fn is_healthy(&self) -> bool;
}
