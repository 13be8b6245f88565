//! Route modules for the impersonation console.

mod activity;
mod impersonation;
mod users;

pub use activity::{ActivityItem, ActivityRoutes};
pub use impersonation::{ImpersonationRoutes, StartParams};
pub use users::{UserRoutes, UserRow};

use crate::error::OverseerError;
use crate::http::Found;
use axum::response::{IntoResponse, Response};

/// Send unauthenticated callers to the login page, render anything else.
fn login_or_error(login_url: &str, dev_mode: bool, err: OverseerError) -> Response {
    match err {
        OverseerError::Unauthorized(_) | OverseerError::SessionInvalid(_) => {
            Found::to(login_url).into_response()
        }
        other => other.into_response_with_mode(dev_mode),
    }
}
