use crate::{
    app::AppContext,
    config::Config,
    health,
    http::RouteModule,
    middleware::MakeRequestUuid,
    routes::{ActivityRoutes, ImpersonationRoutes, UserRoutes},
};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The overseer HTTP application
///
/// Owns the router and the [`AppContext`] it is served with. `/health` is
/// always mounted; everything else comes in through [`RouteModule`]s.
pub struct App {
    router: Router<AppContext>,
    context: AppContext,
}

impl App {
    /// Creates a new App with default configuration and in-memory stores
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new App with in-memory stores and the given configuration
    pub fn with_config(config: Config) -> Self {
        Self::from_context(AppContext::new(config))
    }

    fn from_context(context: AppContext) -> Self {
        Self {
            router: Self::build_router(),
            context,
        }
    }

    /// Builder pattern for constructing an App
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    fn build_router() -> Router<AppContext> {
        Router::<AppContext>::new().route("/health", get(health::health_handler))
    }

    /// Register a route module with the application
    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.router = module.register(self.router);
        self
    }

    /// Register the impersonation, user list and activity log routes
    pub fn with_admin_routes(self) -> Self {
        self.register_module(ImpersonationRoutes)
            .register_module(UserRoutes)
            .register_module(ActivityRoutes)
    }

    /// Replace the application context
    pub fn with_context(mut self, context: AppContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Router with state and middleware applied, ready for `oneshot` tests
    pub fn into_test_router(self) -> Router {
        self.with_middleware()
    }

    fn with_middleware(self) -> Router {
        // Outer to inner: trace, request id, handlers.
        self.router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .with_state(self.context)
    }

    /// Start the application server
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let addr = self
            .context
            .config
            .server
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        let router = self.with_middleware();

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for App with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppBuilder {
    context: Option<AppContext>,
    config: Config,
    modules: Vec<Router<AppContext>>,
    admin_routes: bool,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            context: None,
            config: Config::default(),
            modules: Vec::new(),
            admin_routes: false,
        }
    }

    /// Configuration for the in-memory context; ignored when a context is set
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_context(mut self, context: AppContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_admin_routes(mut self) -> Self {
        self.admin_routes = true;
        self
    }

    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.modules.push(module.register(Router::new()));
        self
    }

    pub fn build(self) -> App {
        let context = self
            .context
            .unwrap_or_else(|| AppContext::new(self.config));
        let mut app = App::from_context(context);

        if self.admin_routes {
            app = app.with_admin_routes();
        }

        for module_router in self.modules {
            app.router = app.router.merge(module_router);
        }

        app
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
