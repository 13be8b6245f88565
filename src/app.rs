use std::sync::Arc;

use crate::audit::{
    ActivityEvent, ActivityLogger, AuditStore, InMemoryAuditStore, NewActivity, Translator,
};
use crate::auth::impersonation::ImpersonationService;
use crate::config::Config;
use crate::error::Result;
use crate::identity::{InMemoryPrincipalStore, Principal, PrincipalStore};
use crate::rbac::{self, GrantStore, InMemoryGrantStore, SyncReport};
use crate::request::RequestMeta;
use crate::session::InMemorySessionStore;
use crate::traits::session::SessionStore;

/// Application context for dependency injection and shared state
///
/// Holds the stores and services every handler reaches for. Any store left
/// unset in the builder falls back to its in-memory implementation.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub principals: Arc<dyn PrincipalStore>,
    pub audit: Arc<dyn AuditStore>,
    pub grants: Arc<dyn GrantStore>,
    pub translator: Arc<Translator>,
    pub activity: ActivityLogger,
    pub impersonation: ImpersonationService,
}

impl AppContext {
    /// Context with in-memory stores and the given configuration.
    pub fn new(config: Config) -> Self {
        Self::builder().with_config(config).build()
    }

    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// Reconcile the grant store with the compiled role table.
    ///
    /// A run that changed anything is recorded as `roles.synced`, caused by
    /// `causer` when one is given (a console command has none).
    pub async fn sync_grants(
        &self,
        causer: Option<&Principal>,
        meta: &RequestMeta,
    ) -> Result<SyncReport> {
        let report = rbac::sync_grants(self.grants.as_ref()).await?;

        if !report.is_noop() {
            let mut activity = NewActivity::new("rbac", ActivityEvent::RolesSynced)
                .with_property("report", serde_json::to_value(&report)?);
            if let Some(causer) = causer {
                activity = activity.caused_by(causer);
            }
            self.activity.record(activity, meta).await?;
        }

        Ok(report)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    config: Config,
    sessions: Option<Arc<dyn SessionStore>>,
    principals: Option<Arc<dyn PrincipalStore>>,
    audit: Option<Arc<dyn AuditStore>>,
    grants: Option<Arc<dyn GrantStore>>,
    translator: Option<Translator>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            sessions: None,
            principals: None,
            audit: None,
            grants: None,
            translator: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the session store
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Set the identity store
    pub fn with_principals(mut self, principals: Arc<dyn PrincipalStore>) -> Self {
        self.principals = Some(principals);
        self
    }

    /// Set the activity log store
    pub fn with_audit(mut self, audit: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Set the grant store
    pub fn with_grants(mut self, grants: Arc<dyn GrantStore>) -> Self {
        self.grants = Some(grants);
        self
    }

    /// Replace the default translator (built-in English catalog)
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn build(self) -> AppContext {
        let config = self.config;

        let sessions = self.sessions.unwrap_or_else(|| {
            Arc::new(InMemorySessionStore::new(config.session.default_ttl()))
        });
        let principals = self
            .principals
            .unwrap_or_else(|| Arc::new(InMemoryPrincipalStore::new()));
        let audit = self
            .audit
            .unwrap_or_else(|| Arc::new(InMemoryAuditStore::new()));
        let grants = self
            .grants
            .unwrap_or_else(|| Arc::new(InMemoryGrantStore::new()));
        let translator = self.translator.unwrap_or_else(|| {
            Translator::new(
                &config.audit.description_namespace,
                config.audit.default_locale.clone(),
            )
        });

        let activity = ActivityLogger::new(audit.clone(), config.audit.description_namespace.clone());
        let impersonation = ImpersonationService::new(
            sessions.clone(),
            principals.clone(),
            activity.clone(),
            config.impersonation.clone(),
        );

        AppContext {
            config: Arc::new(config),
            sessions,
            principals,
            audit,
            grants,
            translator: Arc::new(translator),
            activity,
            impersonation,
        }
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
