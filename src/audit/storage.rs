//! Activity log storage.
//!
//! The store is append-only. There is no update or delete path.

use async_trait::async_trait;

use super::event::AuditEvent;
use super::query::AuditQuery;
use crate::error::Result;
use crate::pagination::PaginatedResult;

/// Append-only activity log storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a new record.
    async fn append(&self, event: &AuditEvent) -> Result<()>;

    async fn find(&self, id: &str) -> Result<Option<AuditEvent>>;

    /// Filtered records, newest first.
    async fn query(&self, query: &AuditQuery) -> Result<PaginatedResult<AuditEvent>>;
}

mod in_memory {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory activity log.
    #[derive(Clone, Default)]
    pub struct InMemoryAuditStore {
        events: Arc<RwLock<Vec<AuditEvent>>>,
    }

    impl InMemoryAuditStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of every record in append order.
        pub async fn all(&self) -> Vec<AuditEvent> {
            self.events.read().await.clone()
        }

        pub async fn len(&self) -> usize {
            self.events.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.events.read().await.is_empty()
        }
    }

    #[async_trait]
    impl AuditStore for InMemoryAuditStore {
        async fn append(&self, event: &AuditEvent) -> Result<()> {
            self.events.write().await.push(event.clone());
            Ok(())
        }

        async fn find(&self, id: &str) -> Result<Option<AuditEvent>> {
            Ok(self.events.read().await.iter().find(|e| e.id == id).cloned())
        }

        async fn query(&self, query: &AuditQuery) -> Result<PaginatedResult<AuditEvent>> {
            // Reverse append order is newest first even when timestamps tie.
            let matched: Vec<AuditEvent> = self
                .events
                .read()
                .await
                .iter()
                .rev()
                .filter(|e| query.matches(e))
                .cloned()
                .collect();

            Ok(PaginatedResult::from_vec(
                matched,
                query.page,
                query.page_size(),
            ))
        }
    }
}

pub use in_memory::InMemoryAuditStore;
