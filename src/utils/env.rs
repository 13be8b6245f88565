/// Read an environment variable with the `OVERSEER_` prefix, falling back to
/// the unprefixed name.
///
/// ```rust,ignore
/// // Checks OVERSEER_LOGIN_URL first, then LOGIN_URL
/// let login_url = get_env_with_prefix("LOGIN_URL");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("OVERSEER_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a boolean-ish environment value (`true/false`, `1/0`, `yes/no`).
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
