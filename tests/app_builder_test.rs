//! Tests for App and AppBuilder functionality

use axum::{Json, Router, routing::get};
use serde_json::json;
use overseer::testing::get as test_get;
use overseer::{App, AppContext, RouteModule};

// A module with a prefix
struct PrefixedModule;

impl RouteModule for PrefixedModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route(
            "/hello",
            get(|| async { Json(json!({"message": "hello from prefixed"})) }),
        )
    }

    fn prefix(&self) -> Option<&str> {
        Some("/api/v1")
    }
}

#[tokio::test]
async fn test_app_builder_respects_module_prefix() {
    let app = App::builder()
        .register_module(PrefixedModule)
        .build()
        .into_test_router();

    test_get(app.clone(), "/api/v1/hello")
        .execute()
        .await
        .assert_ok();

    test_get(app, "/hello").execute().await.assert_not_found();
}

#[tokio::test]
async fn test_health_is_always_mounted() {
    let app = App::new().into_test_router();

    test_get(app, "/health")
        .execute()
        .await
        .assert_ok()
        .assert_json()
        .assert_json_path("status", json!("healthy"))
        .await;
}

#[tokio::test]
async fn test_admin_routes_are_opt_in() {
    let bare = App::new().into_test_router();
    test_get(bare, "/users").execute().await.assert_not_found();

    let full = App::new().with_admin_routes().into_test_router();
    // No session cookie: the extractor rejects before the handler runs.
    let response = test_get(full, "/users").execute().await.response();
    assert_ne!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = App::new().into_test_router();

    let response = test_get(app.clone(), "/health").execute().await.response();
    assert!(response.headers().contains_key("x-request-id"));

    test_get(app, "/health")
        .header("x-request-id", "req-123")
        .execute()
        .await
        .assert_header("x-request-id", "req-123");
}
