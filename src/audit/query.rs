use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::AuditEvent;
use crate::pagination::default_page;

/// Filters for listing activity records.
///
/// Every set field must match. Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub log_name: Option<String>,
    pub event: Option<String>,
    pub causer_id: Option<String>,
    pub subject_id: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring over event, description and the serialized
    /// JSON properties.
    ///
    /// Property keys are part of the serialized text, so a term such as
    /// `issuer` matches every impersonation row. Use the `event`, `causer_id`
    /// and `subject_id` filters for structured lookups.
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    /// Falls back to the configured page size when absent.
    pub per_page: Option<u32>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self {
            page: default_page(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn log_name(mut self, log_name: impl Into<String>) -> Self {
        self.log_name = Some(log_name.into());
        self
    }

    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn causer(mut self, id: impl Into<String>) -> Self {
        self.causer_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// See [`AuditQuery::search`](struct.AuditQuery.html#structfield.search)
    /// for what the term is matched against.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = Some(per_page);
        self
    }

    /// Resolve page and page size against configured limits.
    #[must_use]
    pub fn normalized(mut self, default_per_page: u32, max_per_page: u32) -> Self {
        self.page = self.page.max(1);
        let per_page = self.per_page.unwrap_or(default_per_page);
        self.per_page = Some(per_page.clamp(1, max_per_page.max(1)));
        self
    }

    /// Effective page size; call after [`normalized`](Self::normalized).
    pub fn page_size(&self) -> u32 {
        self.per_page.unwrap_or(20).max(1)
    }

    /// Trimmed, lower-cased search term, or `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, event: &AuditEvent) -> bool {
        if self.log_name.as_ref().is_some_and(|l| *l != event.log_name) {
            return false;
        }
        if self.event.as_ref().is_some_and(|e| *e != event.event) {
            return false;
        }
        if let Some(id) = &self.causer_id {
            if event.causer.as_ref().is_none_or(|c| c.id != *id) {
                return false;
            }
        }
        if let Some(id) = &self.subject_id {
            if event.subject.as_ref().is_none_or(|s| s.id != *id) {
                return false;
            }
        }
        if self.from.is_some_and(|from| event.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| event.created_at > to) {
            return false;
        }
        if let Some(term) = self.search_term() {
            let haystack = format!(
                "{} {} {}",
                event.event, event.description, event.properties
            )
            .to_lowercase();
            if !haystack.contains(&term) {
                return false;
            }
        }
        true
    }
}
