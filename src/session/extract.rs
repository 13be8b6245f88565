use crate::app::AppContext;
use crate::error::OverseerError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use cookie::Cookie;
use std::future::Future;

/// Axum extractor for the session id carried in the session cookie.
///
/// Rejects with [`OverseerError::SessionInvalid`] when the cookie is absent,
/// so handlers can send the browser back to the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    /// Find the named cookie in a `Cookie` header value.
    pub fn from_cookie_header(header_value: &str, cookie_name: &str) -> Option<Self> {
        Cookie::split_parse(header_value)
            .filter_map(|c| c.ok())
            .find(|c| c.name() == cookie_name && !c.value().is_empty())
            .map(|c| SessionId(c.value().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for SessionId
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
        let cookie_name = ctx.config.session.cookie_name.clone();

        let found = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| SessionId::from_cookie_header(v, &cookie_name));

        async move { found.ok_or_else(|| OverseerError::session_invalid("no session cookie")) }
    }
}
