//! Session management and storage.
//!
//! Sessions are identified by a cookie and hold the authenticated principal
//! plus the impersonation record while one is active.

mod config;
mod extract;
mod in_memory;

pub use config::SessionConfig;
pub use extract::SessionId;
pub use in_memory::InMemorySessionStore;
