use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use super::login_or_error;
use crate::app::AppContext;
use crate::auth::ImpersonationSession;
use crate::error::OverseerError;
use crate::http::{Found, JsonResponse, RouteModule};
use crate::request::RequestMeta;
use crate::session::SessionId;

/// Query string accepted by `POST /impersonate/{target_id}`
#[derive(Debug, Default, Deserialize)]
pub struct StartParams {
    /// Local path to return to on leave.
    pub return_url: Option<String>,
}

/// `POST /impersonate/{target_id}`, `POST /impersonate/leave` and
/// `GET /impersonation`
pub struct ImpersonationRoutes;

impl RouteModule for ImpersonationRoutes {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/impersonate/leave", post(leave))
            .route("/impersonate/{target_id}", post(start))
            .route("/impersonation", get(status))
    }
}

async fn start(
    State(ctx): State<AppContext>,
    Path(target_id): Path<String>,
    Query(params): Query<StartParams>,
    meta: RequestMeta,
    session_id: Result<SessionId, OverseerError>,
) -> Response {
    let config = ctx.impersonation.config();
    let dev_mode = ctx.config.server.dev_mode;

    let session_id = match session_id {
        Ok(id) => id,
        Err(e) => return login_or_error(&config.login_url, dev_mode, e),
    };

    match ctx
        .impersonation
        .start(
            session_id.as_str(),
            &target_id,
            params.return_url.as_deref(),
            &meta,
        )
        .await
    {
        Ok(outcome) => Found::to(outcome.redirect_to).into_response(),
        Err(e) => login_or_error(&config.login_url, dev_mode, e),
    }
}

async fn leave(
    State(ctx): State<AppContext>,
    meta: RequestMeta,
    session_id: Result<SessionId, OverseerError>,
) -> Response {
    let config = ctx.impersonation.config();
    let dev_mode = ctx.config.server.dev_mode;

    let session_id = match session_id {
        Ok(id) => id,
        Err(e) => return login_or_error(&config.login_url, dev_mode, e),
    };

    match ctx.impersonation.leave(session_id.as_str(), &meta).await {
        Ok(outcome) => Found::to(outcome.return_url).into_response(),
        Err(e) => login_or_error(&config.login_url, dev_mode, e),
    }
}

/// The record behind the "you are impersonating" banner, or `null`
async fn status(
    State(ctx): State<AppContext>,
    session_id: Result<SessionId, OverseerError>,
) -> JsonResponse<Option<ImpersonationSession>> {
    let Ok(session_id) = session_id else {
        return Ok(Json(None));
    };

    Ok(Json(ctx.impersonation.status(session_id.as_str()).await?))
}
