use serde::{Deserialize, Serialize};

use crate::utils::get_env_with_prefix;

/// Activity log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Prefix of every description template key (`{namespace}.{event}`)
    #[serde(default = "default_namespace")]
    pub description_namespace: String,

    /// Locale used when a caller asks for none, and the first fallback
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Page size used when a query does not ask for one
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound for a requested page size
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            description_namespace: default_namespace(),
            default_locale: default_locale(),
            per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

impl AuditConfig {
    /// Load activity log configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ns) = get_env_with_prefix("AUDIT_NAMESPACE") {
            config.description_namespace = ns;
        }

        if let Some(locale) = get_env_with_prefix("AUDIT_LOCALE") {
            config.default_locale = locale;
        }

        if let Some(n) = get_env_with_prefix("AUDIT_PER_PAGE") {
            if let Ok(n) = n.parse() {
                config.per_page = n;
            }
        }

        if let Some(n) = get_env_with_prefix("AUDIT_MAX_PER_PAGE") {
            if let Ok(n) = n.parse() {
                config.max_per_page = n;
            }
        }

        config
    }
}

fn default_namespace() -> String {
    "activity".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}
