use std::sync::Arc;

use super::config::ImpersonationConfig;
use super::policy::{self, DenialReason};
use super::state::{self, ImpersonationSession, ImpersonationState};
use crate::audit::{ActivityEvent, ActivityLogger, NewActivity};
use crate::error::{OverseerError, Result};
use crate::identity::{Principal, PrincipalStore};
use crate::request::RequestMeta;
use crate::traits::session::{SessionData, SessionStore};

/// Result of a successful start.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub record: ImpersonationSession,
    pub actor: Principal,
    pub target: Principal,
    /// Landing page for the impersonated session.
    pub redirect_to: String,
}

/// Result of a successful leave.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub original: Principal,
    pub impersonated: Principal,
    pub return_url: String,
}

/// Drives the `Idle` ⇄ `Impersonating` transitions for web sessions.
///
/// Each transition commits the session with compare-and-save and then
/// appends its activity record. If the append fails the session is put back
/// and the request fails with [`OverseerError::AuditWrite`].
#[derive(Clone)]
pub struct ImpersonationService {
    sessions: Arc<dyn SessionStore>,
    principals: Arc<dyn PrincipalStore>,
    activity: ActivityLogger,
    config: ImpersonationConfig,
}

impl ImpersonationService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        principals: Arc<dyn PrincipalStore>,
        activity: ActivityLogger,
        config: ImpersonationConfig,
    ) -> Self {
        Self {
            sessions,
            principals,
            activity,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ImpersonationConfig {
        &self.config
    }

    /// Start impersonating `target_id` from the session `session_id`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the session has no authenticated principal
    /// - `SessionInvalid` when the session is gone or changed concurrently
    /// - `NotFound` when the target does not exist
    /// - `Forbidden` when the predicate denies, or the session is already
    ///   impersonating
    /// - `AuditWrite` when the activity record could not be stored
    pub async fn start(
        &self,
        session_id: &str,
        target_id: &str,
        return_url: Option<&str>,
        meta: &RequestMeta,
    ) -> Result<StartOutcome> {
        let mut session = self.load_session(session_id).await?;

        let actor_id = session
            .principal_id()
            .ok_or_else(|| OverseerError::unauthorized("Not signed in"))?
            .to_string();
        let actor = self
            .principals
            .find_by_id(&actor_id)
            .await?
            .ok_or_else(|| OverseerError::session_invalid("Signed-in user no longer exists"))?;

        if self.read_state(&session)?.is_impersonating() {
            return Err(self.reject(&actor, target_id, DenialReason::AlreadyImpersonating));
        }

        let Some(target) = self.principals.find_by_id(target_id).await? else {
            tracing::warn!(
                target: "overseer.impersonation.rejected",
                actor_id = %actor.id,
                target_id = %target_id,
                reason = "target_not_found",
                "Impersonation rejected: target not found"
            );
            return Err(OverseerError::not_found("User not found"));
        };

        if let Err(reason) = policy::check(&actor, &target) {
            return Err(self.reject(&actor, &target.id, reason));
        }

        let return_url = return_url
            .filter(|u| is_local_path(u))
            .unwrap_or(self.config.default_return_url.as_str())
            .to_string();

        let previous = session.clone();
        let expected = session.version;
        let record = state::enter(
            &mut session,
            &self.config.session_key,
            &actor.id,
            &target.id,
            &return_url,
        )?;

        self.commit(session_id, session, expected).await?;

        let logged = self
            .activity
            .record(
                NewActivity::new(self.config.log_name.as_str(), ActivityEvent::ImpersonateStart)
                    .caused_by(&actor)
                    .performed_on(&target)
                    .with_property("target", target.name.as_str()),
                meta,
            )
            .await;

        if let Err(e) = logged {
            self.restore(session_id, previous, expected + 1).await;
            return Err(e);
        }

        tracing::info!(
            target: "overseer.impersonation.started",
            actor_id = %actor.id,
            target_id = %target.id,
            return_url = %record.return_url,
            "Impersonation started"
        );

        Ok(StartOutcome {
            record,
            actor,
            target,
            redirect_to: self.config.redirect_to.clone(),
        })
    }

    /// Leave the current impersonation and restore the original principal.
    ///
    /// # Errors
    ///
    /// - `SessionInvalid` when there is no impersonation to leave, when
    ///   either principal can no longer be resolved (the session is then
    ///   logged out), or when another request already left
    /// - `AuditWrite` when the activity record could not be stored
    pub async fn leave(&self, session_id: &str, meta: &RequestMeta) -> Result<LeaveOutcome> {
        let mut session = self.load_session(session_id).await?;

        let record = match self.read_state(&session)? {
            ImpersonationState::Impersonating(record) => record,
            ImpersonationState::Idle => {
                return Err(OverseerError::session_invalid("Not impersonating"));
            }
        };

        let original = self.principals.find_by_id(&record.original_user_id).await?;
        let impersonated = match session.principal_id() {
            Some(id) => self.principals.find_by_id(id).await?,
            None => None,
        };

        let (Some(original), Some(impersonated)) = (original, impersonated) else {
            tracing::warn!(
                target: "overseer.impersonation.left",
                original_user_id = %record.original_user_id,
                "Impersonation could not be resumed; signing out"
            );
            let expected = session.version;
            state::abandon(&mut session, &self.config.session_key);
            // A lost race here still leaves the session without a usable record.
            let _ = self
                .sessions
                .compare_and_save(session_id, session, expected)
                .await?;
            return Err(OverseerError::session_invalid(
                "Impersonation session could not be resumed",
            ));
        };

        let previous = session.clone();
        let expected = session.version;
        state::exit(&mut session, &self.config.session_key, &original.id);

        self.commit(session_id, session, expected).await?;

        let logged = self
            .activity
            .record(
                NewActivity::new(self.config.log_name.as_str(), ActivityEvent::ImpersonateLeave)
                    .caused_by(&original)
                    .performed_on(&impersonated)
                    .with_property("target", impersonated.name.as_str()),
                meta,
            )
            .await;

        if let Err(e) = logged {
            self.restore(session_id, previous, expected + 1).await;
            return Err(e);
        }

        tracing::info!(
            target: "overseer.impersonation.left",
            original_user_id = %original.id,
            impersonated_user_id = %impersonated.id,
            "Impersonation ended"
        );

        let return_url = if record.return_url.is_empty() {
            self.config.default_return_url.clone()
        } else {
            record.return_url
        };

        Ok(LeaveOutcome {
            original,
            impersonated,
            return_url,
        })
    }

    /// The active impersonation record, if any.
    pub async fn status(&self, session_id: &str) -> Result<Option<ImpersonationSession>> {
        let Some(session) = self.sessions.load(session_id).await? else {
            return Ok(None);
        };

        Ok(match self.read_state(&session)? {
            ImpersonationState::Impersonating(record) => Some(record),
            ImpersonationState::Idle => None,
        })
    }

    /// Whether the given session is currently impersonating.
    pub fn is_impersonating(&self, session: &SessionData) -> bool {
        self.read_state(session)
            .map(|s| s.is_impersonating())
            .unwrap_or(false)
    }

    async fn load_session(&self, session_id: &str) -> Result<SessionData> {
        self.sessions
            .load(session_id)
            .await?
            .ok_or_else(|| OverseerError::session_invalid("Session expired"))
    }

    fn read_state(&self, session: &SessionData) -> Result<ImpersonationState> {
        state::read(session, &self.config.session_key)
            .map_err(|e| OverseerError::session_invalid(format!("Corrupt impersonation record: {e}")))
    }

    async fn commit(&self, session_id: &str, session: SessionData, expected: u64) -> Result<()> {
        if self
            .sessions
            .compare_and_save(session_id, session, expected)
            .await?
        {
            Ok(())
        } else {
            tracing::warn!(
                target: "overseer.impersonation.rejected",
                reason = "concurrent_update",
                "Session changed during impersonation transition"
            );
            Err(OverseerError::session_invalid("Session changed concurrently"))
        }
    }

    async fn restore(&self, session_id: &str, previous: SessionData, expected: u64) {
        match self
            .sessions
            .compare_and_save(session_id, previous, expected)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::error!(
                target: "overseer.impersonation.rejected",
                "Could not roll back session after audit failure: session changed"
            ),
            Err(e) => tracing::error!(
                target: "overseer.impersonation.rejected",
                error = %e,
                "Could not roll back session after audit failure"
            ),
        }
    }

    fn reject(&self, actor: &Principal, target_id: &str, reason: DenialReason) -> OverseerError {
        tracing::warn!(
            target: "overseer.impersonation.rejected",
            actor_id = %actor.id,
            target_id = %target_id,
            reason = reason.as_str(),
            "Impersonation rejected"
        );
        OverseerError::forbidden(reason.message())
    }
}

/// Same-site absolute path, not a protocol-relative URL.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, AuditQuery, AuditStore, EntityRef, InMemoryAuditStore};
    use crate::identity::InMemoryPrincipalStore;
    use crate::pagination::PaginatedResult;
    use crate::rbac::Role;
    use crate::session::InMemorySessionStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const SID: &str = "sess-1";

    struct Harness {
        service: ImpersonationService,
        sessions: InMemorySessionStore,
        audit: Arc<FlakyAuditStore>,
    }

    #[derive(Default)]
    struct FlakyAuditStore {
        inner: InMemoryAuditStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl AuditStore for FlakyAuditStore {
        async fn append(&self, event: &AuditEvent) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(OverseerError::audit_write("store offline"));
            }
            self.inner.append(event).await
        }

        async fn find(&self, id: &str) -> Result<Option<AuditEvent>> {
            self.inner.find(id).await
        }

        async fn query(&self, query: &AuditQuery) -> Result<PaginatedResult<AuditEvent>> {
            self.inner.query(query).await
        }
    }

    async fn harness() -> Harness {
        let principals = InMemoryPrincipalStore::new();
        principals
            .insert(Principal::new("root", "Root").with_role(Role::SuperAdmin))
            .await;
        principals
            .insert(Principal::new("admin", "Ada Admin").with_role(Role::Admin))
            .await;
        principals
            .insert(Principal::new("admin2", "Other Admin").with_role(Role::Admin))
            .await;
        principals
            .insert(Principal::new("user", "Bob User").with_role(Role::User))
            .await;

        let sessions = InMemorySessionStore::new(Duration::from_secs(3600));
        let audit = Arc::new(FlakyAuditStore::default());
        let service = ImpersonationService::new(
            Arc::new(sessions.clone()),
            Arc::new(principals),
            ActivityLogger::new(audit.clone(), "activity"),
            ImpersonationConfig::default(),
        );

        Harness {
            service,
            sessions,
            audit,
        }
    }

    async fn session(h: &Harness) -> SessionData {
        h.sessions.load(SID).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_start_swaps_principal_and_records() {
        let h = harness().await;
        h.sessions.login(SID, "admin").await.unwrap();

        let out = h
            .service
            .start(SID, "user", Some("/users"), &RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(out.redirect_to, "/");

        let data = session(&h).await;
        assert_eq!(data.principal_id(), Some("user"));
        let record = h.service.status(SID).await.unwrap().unwrap();
        assert!(record.is_impersonating);
        assert_eq!(record.original_user_id, "admin");
        assert_eq!(record.return_url, "/users");

        let events = h.audit.inner.all().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "impersonate.start");
        assert_eq!(events[0].log_name, "impersonation");
        assert_eq!(events[0].causer, Some(EntityRef::user("admin")));
        assert_eq!(events[0].subject, Some(EntityRef::user("user")));
        assert_eq!(events[0].property("issuer.name"), Some(&json!("Ada Admin")));
        assert_eq!(events[0].property("target"), Some(&json!("Bob User")));
    }

    #[tokio::test]
    async fn test_denied_start_changes_nothing() {
        let h = harness().await;
        h.sessions.login(SID, "admin").await.unwrap();
        let before = session(&h).await;

        for target in ["admin2", "root", "admin"] {
            let err = h
                .service
                .start(SID, target, None, &RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(err, OverseerError::Forbidden(_)), "{target}");
        }

        let after = session(&h).await;
        assert_eq!(after.version, before.version);
        assert_eq!(after.principal_id(), Some("admin"));
        assert!(!after.has("impersonation"));
        assert!(h.audit.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_regular_user_cannot_start() {
        let h = harness().await;
        h.sessions.login(SID, "user").await.unwrap();

        let err = h
            .service
            .start(SID, "admin", None, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OverseerError::Forbidden(_)));
        assert_eq!(session(&h).await.principal_id(), Some("user"));
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();

        let err = h
            .service
            .start(SID, "ghost", None, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OverseerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_nested_start_rejected() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();
        h.service
            .start(SID, "admin", None, &RequestMeta::default())
            .await
            .unwrap();

        let err = h
            .service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OverseerError::Forbidden(_)));
        assert_eq!(session(&h).await.principal_id(), Some("admin"));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();

        h.service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap();
        let out = h.service.leave(SID, &RequestMeta::default()).await.unwrap();

        assert_eq!(out.return_url, "/dashboard");
        assert_eq!(out.original.id, "root");
        assert_eq!(out.impersonated.id, "user");

        let data = session(&h).await;
        assert_eq!(data.principal_id(), Some("root"));
        assert!(!data.has("impersonation"));
        assert!(h.service.status(SID).await.unwrap().is_none());

        let events = h.audit.inner.all().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event, "impersonate.leave");
        assert_eq!(events[1].causer, Some(EntityRef::user("root")));
        assert_eq!(events[1].subject, Some(EntityRef::user("user")));
    }

    #[tokio::test]
    async fn test_leave_without_start() {
        let h = harness().await;
        h.sessions.login(SID, "admin").await.unwrap();
        let before = session(&h).await;

        let err = h.service.leave(SID, &RequestMeta::default()).await.unwrap_err();
        assert!(err.is_session_invalid());

        let after = session(&h).await;
        assert_eq!(after.version, before.version);
        assert!(h.audit.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_leave_with_vanished_original_signs_out() {
        let principals = InMemoryPrincipalStore::new();
        principals
            .insert(Principal::new("root", "Root").with_role(Role::SuperAdmin))
            .await;
        principals.insert(Principal::new("user", "Bob")).await;

        let sessions = InMemorySessionStore::new(Duration::from_secs(3600));
        let audit = Arc::new(InMemoryAuditStore::new());
        let service = ImpersonationService::new(
            Arc::new(sessions.clone()),
            Arc::new(principals.clone()),
            ActivityLogger::new(audit.clone(), "activity"),
            ImpersonationConfig::default(),
        );

        sessions.login(SID, "root").await.unwrap();
        service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap();
        principals.remove("root").await;

        let err = service.leave(SID, &RequestMeta::default()).await.unwrap_err();
        assert!(err.is_session_invalid());

        let data = sessions.load(SID).await.unwrap().unwrap();
        assert!(data.principal_id().is_none());
        assert!(!data.has("impersonation"));
        assert_eq!(audit.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_leave_fails_closed() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();
        h.service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap();

        let meta = RequestMeta::default();
        let (a, b) = tokio::join!(h.service.leave(SID, &meta), h.service.leave(SID, &meta));

        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1);
        let failed = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(failed.is_session_invalid());

        let leaves = h
            .audit
            .inner
            .query(&AuditQuery::new().event("impersonate.leave"))
            .await
            .unwrap();
        assert_eq!(leaves.total, 1);
    }

    #[tokio::test]
    async fn test_audit_failure_rolls_back_start() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();
        h.audit.failing.store(true, Ordering::SeqCst);

        let err = h
            .service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OverseerError::AuditWrite(_)));

        let data = session(&h).await;
        assert_eq!(data.principal_id(), Some("root"));
        assert!(!data.has("impersonation"));
    }

    #[tokio::test]
    async fn test_audit_failure_rolls_back_leave() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();
        h.service
            .start(SID, "user", None, &RequestMeta::default())
            .await
            .unwrap();
        h.audit.failing.store(true, Ordering::SeqCst);

        let err = h.service.leave(SID, &RequestMeta::default()).await.unwrap_err();
        assert!(matches!(err, OverseerError::AuditWrite(_)));

        let data = session(&h).await;
        assert_eq!(data.principal_id(), Some("user"));
        assert!(h.service.status(SID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_foreign_return_url_replaced() {
        let h = harness().await;
        h.sessions.login(SID, "root").await.unwrap();

        h.service
            .start(SID, "user", Some("//evil.example"), &RequestMeta::default())
            .await
            .unwrap();

        let record = h.service.status(SID).await.unwrap().unwrap();
        assert_eq!(record.return_url, "/dashboard");
    }

    #[tokio::test]
    async fn test_missing_session() {
        let h = harness().await;
        let err = h
            .service
            .start("nope", "user", None, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(err.is_session_invalid());
        assert!(h.service.status("nope").await.unwrap().is_none());
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/users?page=2"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("/\\evil.example"));
    }
}
