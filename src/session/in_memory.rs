use crate::error::Result;
use crate::traits::session::{SessionData, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory session store implementation
///
/// Stores sessions in a HashMap. Suitable for development and testing,
/// but not for production (sessions are lost on restart and not shared
/// across instances).
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    default_ttl: Duration,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    /// Start a fresh session authenticated as `principal_id`.
    ///
    /// Credential checks happen upstream; this only binds the principal.
    pub async fn login(&self, session_id: &str, principal_id: &str) -> Result<()> {
        let mut data = SessionData::new(self.default_ttl);
        data.set_principal(principal_id);
        self.save(session_id, data).await
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>> {
        let sessions = self.sessions.read().await;

        if let Some(session) = sessions.get(session_id) {
            if session.is_expired() {
                drop(sessions);
                let mut sessions = self.sessions.write().await;
                sessions.remove(session_id);
                return Ok(None);
            }
            Ok(Some(session.clone()))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, session_id: &str, mut data: SessionData) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(session_id).map(|s| s.version).unwrap_or(0);
        data.version = current + 1;
        sessions.insert(session_id.to_string(), data);
        Ok(())
    }

    async fn compare_and_save(
        &self,
        session_id: &str,
        mut data: SessionData,
        expected_version: u64,
    ) -> Result<bool> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(session_id) {
            Some(current) if current.version == expected_version && !current.is_expired() => {
                data.version = expected_version + 1;
                sessions.insert(session_id.to_string(), data);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let initial_len = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        let removed = initial_len - sessions.len();
        Ok(removed)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600 * 24))
    }
}
