//! Overseer - audited user impersonation for Axum back-office apps
//!
//! An administrator with the right grants can act as another, lower-ranked
//! user and later return to their own identity. Every start and leave is
//! written to an append-only activity log with the issuer's request context.
//!
//! # Features
//!
//! - **Impersonation**: authorization predicate, session state machine,
//!   HTTP routes with login redirects
//! - **Activity log**: merged request/issuer properties, filtered paginated
//!   queries, translated descriptions
//! - **RBAC**: closed permission and role enums with a grant-store sync
//! - **Database**: SeaORM stores for grants and the activity log
//! - **Testing**: Alba-style HTTP scenarios and in-memory fixtures
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use overseer::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     overseer::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!
//!     App::with_config(config).with_admin_routes().serve().await?;
//!     Ok(())
//! }
//! ```

mod app;
pub mod audit;
pub mod auth;
mod config;
mod core;
mod error;
pub mod health;
mod http;
pub mod identity;
mod middleware;
mod pagination;
pub mod rbac;
mod request;
pub mod routes;
pub mod session;
pub mod testing;
pub mod traits;
mod utils;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use core::{App, AppBuilder};
pub use error::{OverseerError, Result};
pub use health::{ComponentHealth, HealthCheck, HealthChecker, HealthStatus};
pub use http::{ApiResponse, Found, JsonResponse, PaginatedData, PaginationMeta, RouteModule};
pub use pagination::PaginatedResult;
pub use request::RequestMeta;
pub use traits::session::{SessionData, SessionStore};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// Call once, early in `main`.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "overseer=debug")
/// - `OVERSEER_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .and_then(|v| utils::parse_flag(&v))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from the logging section of a [`Config`]
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    // try_init: a second call (tests, embedding apps) keeps the first subscriber.
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
