use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::event::{AuditEvent, EntityRef, NewActivity};
use super::properties::build_properties;
use super::storage::AuditStore;
use crate::error::{OverseerError, Result};
use crate::request::RequestMeta;

/// Appends activity records to an [`AuditStore`].
#[derive(Clone)]
pub struct ActivityLogger {
    store: Arc<dyn AuditStore>,
    namespace: String,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn AuditStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Template key stored with an event, `{namespace}.{event}`.
    pub fn description_key(&self, event: &str) -> String {
        format!("{}.{}", self.namespace, event)
    }

    /// Merge defaults into the caller's properties and append the record.
    ///
    /// # Errors
    ///
    /// Any store failure is reported as [`OverseerError::AuditWrite`].
    pub async fn record(&self, activity: NewActivity, meta: &RequestMeta) -> Result<AuditEvent> {
        let properties = build_properties(activity.causer.as_ref(), meta, &activity.properties);

        let event = AuditEvent {
            id: uuid::Uuid::new_v4().to_string(),
            description: self.description_key(&activity.event),
            log_name: activity.log_name,
            event: activity.event,
            subject: activity.subject,
            causer: activity.causer.as_ref().map(EntityRef::from),
            properties: Value::Object(properties),
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append(&event).await {
            tracing::error!(
                target: "overseer.audit.recorded",
                log_name = %event.log_name,
                event = %event.event,
                error = %e,
                "Failed to append activity record"
            );
            return Err(match e {
                OverseerError::AuditWrite(_) => e,
                other => OverseerError::audit_write(other.to_string()),
            });
        }

        tracing::info!(
            target: "overseer.audit.recorded",
            id = %event.id,
            log_name = %event.log_name,
            event = %event.event,
            causer_id = event.causer.as_ref().map(|c| c.id.as_str()),
            subject_id = event.subject.as_ref().map(|s| s.id.as_str()),
            "Activity recorded"
        );

        Ok(event)
    }
}
