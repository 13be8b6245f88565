use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::app::AppContext;
use crate::auth::Authenticated;
use crate::auth::impersonation::{ImpersonationAffordance, affordance};
use crate::error::{OverseerError, Result};
use crate::http::{ApiResponse, PaginatedData, RouteModule};
use crate::identity::{ListUsersParams, Principal, PrincipalStatus};
use crate::rbac::{Permission, Role};

/// One row of the user list as the viewer sees it
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub status: PrincipalStatus,
    pub roles: Vec<Role>,
    pub impersonate: ImpersonationAffordance,
}

impl UserRow {
    fn new(principal: Principal, impersonate: ImpersonationAffordance) -> Self {
        Self {
            id: principal.id,
            name: principal.name,
            email: principal.email,
            status: principal.status,
            roles: principal.roles,
            impersonate,
        }
    }
}

/// `GET /users`
pub struct UserRoutes;

impl RouteModule for UserRoutes {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/users", get(list_users))
    }
}

async fn list_users(
    State(ctx): State<AppContext>,
    auth: Authenticated,
    Query(params): Query<ListUsersParams>,
) -> Result<ApiResponse<PaginatedData<UserRow>>> {
    if !auth.principal.has_permission(Permission::ViewUsers) {
        return Err(OverseerError::forbidden("Missing permission users.view"));
    }

    let impersonating = ctx.impersonation.is_impersonating(&auth.session);
    let page = ctx.principals.list(params).await?;

    Ok(ApiResponse::paginated(page.map(|p| {
        let row_affordance = affordance(&auth.principal, &p, impersonating);
        UserRow::new(p, row_affordance)
    })))
}
