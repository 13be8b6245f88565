use crate::app::AppContext;
use crate::error::OverseerError;
use crate::identity::Principal;
use crate::session::SessionId;
use crate::traits::session::SessionData;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::future::Future;

/// Axum extractor for the signed-in principal of a cookie session
///
/// Rejects with `SessionInvalid` when the cookie or the session is missing
/// and with `Unauthorized` when the session carries no resolvable principal.
/// Take `Result<Authenticated, OverseerError>` to handle rejection yourself.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(auth: Authenticated) -> Json<Principal> {
///     Json(auth.principal)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session_id: SessionId,
    pub session: SessionData,
    pub principal: Principal,
}

impl<S> FromRequestParts<S> for Authenticated
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = OverseerError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let ctx = AppContext::from_ref(state);
        let session_id = SessionId::from_request_parts(parts, state);

        Box::pin(async move {
            let session_id = session_id.await?;

            let session = ctx
                .sessions
                .load(session_id.as_str())
                .await?
                .ok_or_else(|| OverseerError::session_invalid("Session expired"))?;

            let principal_id = session
                .principal_id()
                .ok_or_else(|| OverseerError::unauthorized("Not signed in"))?;

            let principal = ctx
                .principals
                .find_by_id(principal_id)
                .await?
                .ok_or_else(|| OverseerError::unauthorized("Signed-in user no longer exists"))?;

            Ok(Authenticated {
                session_id,
                session,
                principal,
            })
        })
    }
}
