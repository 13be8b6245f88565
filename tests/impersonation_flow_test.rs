//! End-to-end impersonation over HTTP

use axum::http::StatusCode;
use serde_json::{Value, json};
use overseer::identity::{Principal, PrincipalStatus};
use overseer::testing::{self, TestApp, TestPrincipal};

const SESSION_KEY: &str = "impersonation";

struct Cast {
    app: TestApp,
    root: Principal,
    admin: Principal,
    other_admin: Principal,
    user: Principal,
}

async fn cast() -> Cast {
    let app = TestApp::new();
    let root = app
        .add(TestPrincipal::super_admin().with_id("root").with_name("Root").build())
        .await;
    let admin = app
        .add(TestPrincipal::admin().with_id("ada").with_name("Ada").build())
        .await;
    let other_admin = app
        .add(TestPrincipal::admin().with_id("grace").with_name("Grace").build())
        .await;
    let user = app
        .add(TestPrincipal::user().with_id("tom").with_name("Tom").build())
        .await;

    Cast {
        app,
        root,
        admin,
        other_admin,
        user,
    }
}

#[tokio::test]
async fn test_admin_start_then_leave_round_trip() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_query(&[("return_url", "/users")])
        .header("x-forwarded-for", "203.0.113.9")
        .header("user-agent", "integration-test")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.user.id.as_str()));
    let record: Value = serde_json::from_str(session.get(SESSION_KEY).unwrap()).unwrap();
    assert_eq!(record["is_impersonating"], json!(true));
    assert_eq!(record["original_user_id"], json!(c.admin.id));
    assert_eq!(record["return_url"], json!("/users"));

    let events = c.app.activity().await;
    assert_eq!(events.len(), 1);
    let started = &events[0];
    assert_eq!(started.log_name, "impersonation");
    assert_eq!(started.event, "impersonate.start");
    assert_eq!(started.causer.as_ref().unwrap().id, c.admin.id);
    assert_eq!(started.subject.as_ref().unwrap().id, c.user.id);
    assert_eq!(started.property("issuer.name"), Some(&json!("Ada")));
    assert_eq!(started.property("issuer.ip"), Some(&json!("203.0.113.9")));
    assert_eq!(started.property("user_agent"), Some(&json!("integration-test")));
    assert_eq!(started.property("target"), Some(&json!("Tom")));

    testing::get(c.app.router(), "/impersonation")
        .with_session(&sid)
        .execute()
        .await
        .assert_ok()
        .assert_json_path("original_user_id", json!("ada"))
        .await;

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/users");

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.admin.id.as_str()));
    assert!(!session.has(SESSION_KEY));

    let events = c.app.activity().await;
    assert_eq!(events.len(), 2);
    let left = &events[1];
    assert_eq!(left.event, "impersonate.leave");
    assert_eq!(left.causer.as_ref().unwrap().id, c.admin.id);
    assert_eq!(left.subject.as_ref().unwrap().id, c.user.id);

    let status: Value = testing::get(c.app.router(), "/impersonation")
        .with_session(&sid)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(status, Value::Null);
}

#[tokio::test]
async fn test_foreign_return_url_falls_back_to_dashboard() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_query(&[("return_url", "https://evil.example.com/")])
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/dashboard");
}

#[tokio::test]
async fn test_admin_cannot_impersonate_peer_or_superior() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    for target in [&c.other_admin, &c.root] {
        testing::post(c.app.router(), &format!("/impersonate/{}", target.id))
            .with_session(&sid)
            .execute()
            .await
            .assert_forbidden();
    }

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.admin.id.as_str()));
    assert!(!session.has(SESSION_KEY));
    assert!(c.app.activity().await.is_empty());
}

#[tokio::test]
async fn test_self_impersonation_is_forbidden() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.root.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.root.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_forbidden();

    assert!(c.app.activity().await.is_empty());
}

#[tokio::test]
async fn test_super_admin_can_impersonate_admin() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.root.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.admin.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.admin.id.as_str()));
}

#[tokio::test]
async fn test_nested_impersonation_is_forbidden() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.root.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.admin.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    // Acting as Ada, who could otherwise impersonate Tom.
    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_forbidden();

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.admin.id.as_str()));
    assert_eq!(c.app.activity().await.len(), 1);
}

#[tokio::test]
async fn test_inactive_target_is_forbidden() {
    let c = cast().await;
    let suspended = c
        .app
        .add(
            TestPrincipal::user()
                .with_status(PrincipalStatus::Suspended)
                .build(),
        )
        .await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", suspended.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_forbidden();
}

#[tokio::test]
async fn test_regular_user_cannot_start() {
    let c = cast().await;
    let peer = c.app.add(TestPrincipal::user().build()).await;
    let sid = c.app.sign_in(&c.user.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", peer.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_forbidden();

    let session = c.app.session(&sid).await.unwrap();
    assert_eq!(session.principal_id(), Some(c.user.id.as_str()));
    assert!(!session.has(SESSION_KEY));
    assert!(c.app.activity().await.is_empty());
}

#[tokio::test]
async fn test_unknown_target_is_not_found() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), "/impersonate/nobody")
        .with_session(&sid)
        .execute()
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_start_without_session_redirects_to_login() {
    let c = cast().await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .execute()
        .await
        .assert_found("/login");

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_session("expired-or-forged")
        .execute()
        .await
        .assert_found("/login");
}

#[tokio::test]
async fn test_leave_without_start_redirects_to_login() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;
    let before = c.app.session(&sid).await.unwrap();

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/login");

    let after = c.app.session(&sid).await.unwrap();
    assert_eq!(after.principal_id(), before.principal_id());
    assert_eq!(after.version, before.version);
    assert!(c.app.activity().await.is_empty());
}

#[tokio::test]
async fn test_second_leave_fails_closed() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/dashboard");

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/login");

    assert_eq!(c.app.activity().await.len(), 2);
}

#[tokio::test]
async fn test_leave_after_original_is_removed_signs_out() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.user.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    c.app.remove(&c.admin.id).await;

    testing::post(c.app.router(), "/impersonate/leave")
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/login");

    let session = c.app.session(&sid).await.unwrap();
    assert!(session.principal_id().is_none());
    assert!(!session.has(SESSION_KEY));
}

#[tokio::test]
async fn test_users_list_affordances() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.admin.id).await;

    let body: Value = testing::get(c.app.router(), "/users")
        .with_query(&[("per_page", "50")])
        .with_session(&sid)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    let items = body["data"]["items"].as_array().unwrap();
    let affordance_of = |id: &str| {
        items
            .iter()
            .find(|row| row["id"] == json!(id))
            .map(|row| row["impersonate"].clone())
            .unwrap()
    };

    assert_eq!(affordance_of("ada"), json!("hidden"));
    assert_eq!(affordance_of("grace"), json!("disabled"));
    assert_eq!(affordance_of("root"), json!("disabled"));
    assert_eq!(affordance_of("tom"), json!("enabled"));
    assert_eq!(body["data"]["pagination"]["total"], json!(4));
}

#[tokio::test]
async fn test_users_list_hides_actions_while_impersonating() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.root.id).await;

    testing::post(c.app.router(), &format!("/impersonate/{}", c.admin.id))
        .with_session(&sid)
        .execute()
        .await
        .assert_found("/");

    let body: Value = testing::get(c.app.router(), "/users")
        .with_session(&sid)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    for row in body["data"]["items"].as_array().unwrap() {
        assert_eq!(row["impersonate"], json!("hidden"));
    }
}

#[tokio::test]
async fn test_users_list_requires_view_permission() {
    let c = cast().await;
    let sid = c.app.sign_in(&c.user.id).await;

    let response = testing::get(c.app.router(), "/users")
        .with_session(&sid)
        .execute()
        .await
        .response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
