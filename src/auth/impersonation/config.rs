use serde::{Deserialize, Serialize};

use crate::utils::get_env_with_prefix;

/// Configuration for impersonation behavior.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImpersonationConfig {
    /// Session key holding the impersonation record.
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// Where the browser lands after impersonation starts.
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
    /// Return target after leaving when none was stored.
    #[serde(default = "default_return_url")]
    pub default_return_url: String,
    /// Re-authentication page for invalid sessions.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Activity log category for impersonation events.
    #[serde(default = "default_log_name")]
    pub log_name: String,
}

impl Default for ImpersonationConfig {
    fn default() -> Self {
        Self {
            session_key: default_session_key(),
            redirect_to: default_redirect_to(),
            default_return_url: default_return_url(),
            login_url: default_login_url(),
            log_name: default_log_name(),
        }
    }
}

impl ImpersonationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load impersonation configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = get_env_with_prefix("IMPERSONATION_SESSION_KEY") {
            config.session_key = v;
        }
        if let Some(v) = get_env_with_prefix("IMPERSONATION_REDIRECT_TO") {
            config.redirect_to = v;
        }
        if let Some(v) = get_env_with_prefix("IMPERSONATION_RETURN_URL") {
            config.default_return_url = v;
        }
        if let Some(v) = get_env_with_prefix("LOGIN_URL") {
            config.login_url = v;
        }
        if let Some(v) = get_env_with_prefix("IMPERSONATION_LOG_NAME") {
            config.log_name = v;
        }

        config
    }

    #[must_use]
    pub fn redirect_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_to = url.into();
        self
    }

    #[must_use]
    pub fn default_return_url(mut self, url: impl Into<String>) -> Self {
        self.default_return_url = url.into();
        self
    }

    #[must_use]
    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    #[must_use]
    pub fn log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = name.into();
        self
    }
}

fn default_session_key() -> String {
    "impersonation".to_string()
}

fn default_redirect_to() -> String {
    "/".to_string()
}

fn default_return_url() -> String {
    "/dashboard".to_string()
}

fn default_login_url() -> String {
    "/login".to_string()
}

fn default_log_name() -> String {
    "impersonation".to_string()
}
