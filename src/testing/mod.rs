//! Testing utilities for overseer applications
//!
//! - Alba-style HTTP scenarios that never bind a socket
//! - [`TestApp`]: in-memory stores with direct handles for assertions
//! - Principal fixtures and fake data
//!
//! # Example
//!
//! ```rust,ignore
//! use overseer::testing::{self, TestApp, TestPrincipal};
//!
//! #[tokio::test]
//! async fn admin_can_list_users() {
//!     let app = TestApp::new();
//!     let admin = app.add(TestPrincipal::admin().build()).await;
//!     let sid = app.sign_in(&admin.id).await;
//!
//!     testing::get(app.router(), "/users")
//!         .with_session(&sid)
//!         .execute()
//!         .await
//!         .assert_ok();
//! }
//! ```

mod fixtures;
mod harness;
mod scenario;

pub use fixtures::{TestPrincipal, fake};
pub use harness::TestApp;
pub use scenario::{Scenario, ScenarioAssert, get, post};
