use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::audit::{AuditEvent, AuditQuery};
use crate::auth::Authenticated;
use crate::error::{OverseerError, Result};
use crate::http::{ApiResponse, PaginatedData, RouteModule};
use crate::rbac::Permission;

/// An activity record with its description rendered
#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    #[serde(flatten)]
    pub event: AuditEvent,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct LocaleParam {
    locale: Option<String>,
}

/// `GET /activity` and `GET /activity/{id}`
pub struct ActivityRoutes;

impl RouteModule for ActivityRoutes {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/activity", get(list_activity))
            .route("/activity/{id}", get(show_activity))
    }
}

fn require_view(auth: &Authenticated) -> Result<()> {
    if auth.principal.has_permission(Permission::ViewActivityLog) {
        Ok(())
    } else {
        Err(OverseerError::forbidden("Missing permission activity.view"))
    }
}

fn describe(ctx: &AppContext, event: AuditEvent, locale: Option<&str>) -> ActivityItem {
    let message = match locale {
        Some(locale) => ctx.translator.describe_in(&event, locale),
        None => ctx.translator.describe(&event),
    };
    ActivityItem { event, message }
}

async fn list_activity(
    State(ctx): State<AppContext>,
    auth: Authenticated,
    Query(query): Query<AuditQuery>,
    Query(locale): Query<LocaleParam>,
) -> Result<ApiResponse<PaginatedData<ActivityItem>>> {
    require_view(&auth)?;

    let audit = &ctx.config.audit;
    let query = query.normalized(audit.per_page, audit.max_per_page);
    let page = ctx.audit.query(&query).await?;

    Ok(ApiResponse::paginated(
        page.map(|event| describe(&ctx, event, locale.locale.as_deref())),
    ))
}

async fn show_activity(
    State(ctx): State<AppContext>,
    auth: Authenticated,
    Path(id): Path<String>,
    Query(locale): Query<LocaleParam>,
) -> Result<Json<ActivityItem>> {
    require_view(&auth)?;

    let event = ctx
        .audit
        .find(&id)
        .await?
        .ok_or_else(|| OverseerError::not_found("Activity not found"))?;

    Ok(Json(describe(&ctx, event, locale.locale.as_deref())))
}
