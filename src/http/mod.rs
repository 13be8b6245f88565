//! HTTP response types and the RouteModule trait for organizing routes.

pub mod response;
pub mod routes;

pub use response::{ApiResponse, Found, JsonResponse, PaginatedData, PaginationMeta};
pub use routes::RouteModule;
