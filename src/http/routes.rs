use crate::app::AppContext;
use axum::Router;

/// Trait for composable route modules
///
/// Each module returns a router without state; the [`App`](crate::App)
/// applies the [`AppContext`] once all modules are merged.
///
/// # Example
///
/// ```ignore
/// struct ReportsModule;
///
/// impl RouteModule for ReportsModule {
///     fn routes(&self) -> Router<AppContext> {
///         Router::new().route("/reports/{id}", get(show_report))
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    fn routes(&self) -> Router<AppContext>
    where
        Self: Sized;

    /// Optional path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Merge (or nest, with a prefix) this module into `router`
    fn register(self, router: Router<AppContext>) -> Router<AppContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}
