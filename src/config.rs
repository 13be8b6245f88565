use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::audit::AuditConfig;
use crate::auth::impersonation::ImpersonationConfig;
use crate::error::OverseerError;
use crate::session::SessionConfig;
use crate::utils::{get_env_with_prefix, parse_flag};

/// Main configuration for an overseer application
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub impersonation: ImpersonationConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Show internal error details in responses
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.config.server.dev_mode = enabled;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    pub fn with_impersonation(mut self, impersonation: ImpersonationConfig) -> Self {
        self.config.impersonation = impersonation;
        self
    }

    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.config.audit = audit;
        self
    }

    /// Load configuration from environment variables with OVERSEER_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // OVERSEER_PORT first, then PORT for platforms that inject it
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(dev) = get_env_with_prefix("DEV_MODE") {
            self.config.server.dev_mode = parse_flag(&dev).unwrap_or(false);
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = parse_flag(&json).unwrap_or(false);
        }

        self.config.session = SessionConfig::from_env();
        self.config.impersonation = ImpersonationConfig::from_env();
        self.config.audit = AuditConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if any setting is invalid:
    /// - Invalid server address or a zero port
    /// - Unknown log level
    /// - Redirect targets that are not absolute paths
    /// - Empty session key, cookie name or description namespace
    /// - A default page size above the maximum
    pub fn build(self) -> crate::error::Result<Config> {
        let config = self.config;

        config.server.addr().map_err(|e| {
            OverseerError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                config.server.host, config.server.port, e
            ))
        })?;

        if config.server.port == 0 {
            return Err(OverseerError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(OverseerError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let imp = &config.impersonation;
        for (name, url) in [
            ("redirect_to", &imp.redirect_to),
            ("default_return_url", &imp.default_return_url),
            ("login_url", &imp.login_url),
        ] {
            if !url.starts_with('/') {
                return Err(OverseerError::bad_request(format!(
                    "Impersonation {name} must be an absolute path, got: {url}"
                )));
            }
        }

        if imp.session_key.trim().is_empty() {
            return Err(OverseerError::bad_request(
                "Impersonation session key must not be empty",
            ));
        }

        if config.session.cookie_name.trim().is_empty() {
            return Err(OverseerError::bad_request(
                "Session cookie name must not be empty",
            ));
        }

        if config.audit.description_namespace.trim().is_empty() {
            return Err(OverseerError::bad_request(
                "Audit description namespace must not be empty",
            ));
        }

        if config.audit.per_page == 0 || config.audit.per_page > config.audit.max_per_page {
            return Err(OverseerError::bad_request(format!(
                "Audit per_page must be between 1 and max_per_page ({})",
                config.audit.max_per_page
            )));
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
