use axum::Router;
use std::sync::Arc;

use super::fixtures::fake;
use crate::app::AppContext;
use crate::audit::{AuditEvent, InMemoryAuditStore};
use crate::config::Config;
use crate::core::App;
use crate::identity::{InMemoryPrincipalStore, Principal};
use crate::session::InMemorySessionStore;
use crate::traits::session::{SessionData, SessionStore};

/// An [`AppContext`] on in-memory stores the test keeps handles to
///
/// ```rust,ignore
/// let app = TestApp::new();
/// let admin = app.add(TestPrincipal::admin().build()).await;
/// let sid = app.sign_in(&admin.id).await;
/// testing::get(app.router(), "/users").with_session(&sid).execute().await.assert_ok();
/// ```
#[derive(Clone)]
pub struct TestApp {
    pub ctx: AppContext,
    principals: InMemoryPrincipalStore,
    sessions: InMemorySessionStore,
    audit: InMemoryAuditStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let principals = InMemoryPrincipalStore::new();
        let sessions = InMemorySessionStore::new(config.session.default_ttl());
        let audit = InMemoryAuditStore::new();

        let ctx = AppContext::builder()
            .with_config(config)
            .with_principals(Arc::new(principals.clone()))
            .with_sessions(Arc::new(sessions.clone()))
            .with_audit(Arc::new(audit.clone()))
            .build();

        Self {
            ctx,
            principals,
            sessions,
            audit,
        }
    }

    /// Store a principal and hand it back
    pub async fn add(&self, principal: Principal) -> Principal {
        self.principals.insert(principal.clone()).await;
        principal
    }

    pub async fn remove(&self, id: &str) {
        self.principals.remove(id).await;
    }

    /// Open a fresh session signed in as `principal_id` and return its id
    pub async fn sign_in(&self, principal_id: &str) -> String {
        let session_id = fake::uuid();
        self.sessions
            .login(&session_id, principal_id)
            .await
            .expect("in-memory login");
        session_id
    }

    pub async fn session(&self, session_id: &str) -> Option<SessionData> {
        self.sessions.load(session_id).await.expect("in-memory load")
    }

    /// Every recorded activity, oldest first
    pub async fn activity(&self) -> Vec<AuditEvent> {
        self.audit.all().await
    }

    /// Router with every admin route module and middleware applied
    pub fn router(&self) -> Router {
        App::builder()
            .with_context(self.ctx.clone())
            .with_admin_routes()
            .build()
            .into_test_router()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
