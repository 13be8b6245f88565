//! Read-time rendering of activity descriptions.
//!
//! Records store a template key (`activity.impersonate.start`). The
//! translator resolves it against a per-locale catalog and fills in
//! `:issuer`, `:target` and `:email` from the property bag.

use serde_json::Value;
use std::collections::HashMap;

use super::event::{ActivityEvent, AuditEvent};

/// Locale-keyed catalogs of description templates.
#[derive(Debug, Clone)]
pub struct Translator {
    default_locale: String,
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl Translator {
    /// Create a translator with the built-in English catalog.
    pub fn new(namespace: &str, default_locale: impl Into<String>) -> Self {
        let mut translator = Self {
            default_locale: default_locale.into(),
            catalogs: HashMap::new(),
        };

        for event in ActivityEvent::ALL {
            translator.add(
                "en",
                format!("{namespace}.{}", event.as_str()),
                english_template(event),
            );
        }

        translator
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Register or replace one template.
    pub fn add(&mut self, locale: impl Into<String>, key: impl Into<String>, template: impl Into<String>) {
        self.catalogs
            .entry(locale.into())
            .or_default()
            .insert(key.into(), template.into());
    }

    #[must_use]
    pub fn with_catalog<I, K, V>(mut self, locale: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, template) in entries {
            self.add(locale, key, template);
        }
        self
    }

    /// Template for `key`, trying `locale` then the default locale.
    pub fn template(&self, key: &str, locale: &str) -> Option<&str> {
        self.catalogs
            .get(locale)
            .and_then(|c| c.get(key))
            .or_else(|| {
                self.catalogs
                    .get(&self.default_locale)
                    .and_then(|c| c.get(key))
            })
            .map(String::as_str)
    }

    /// Describe an event in the default locale.
    pub fn describe(&self, event: &AuditEvent) -> String {
        self.describe_in(event, &self.default_locale)
    }

    /// Describe an event in `locale`. Falls back to the raw key.
    pub fn describe_in(&self, event: &AuditEvent, locale: &str) -> String {
        match self.template(&event.description, locale) {
            Some(template) => render(template, &replacements(&event.properties)),
            None => event.description.clone(),
        }
    }
}

fn english_template(event: ActivityEvent) -> &'static str {
    match event {
        ActivityEvent::ImpersonateStart => ":issuer started impersonating :target",
        ActivityEvent::ImpersonateLeave => ":issuer stopped impersonating :target",
        ActivityEvent::AuthFailed => "Failed sign-in attempt for :email",
        ActivityEvent::RolesSynced => ":issuer synchronized roles and permissions",
        ActivityEvent::UserCreated => ":issuer created user :target",
        ActivityEvent::UserUpdated => ":issuer updated user :target",
        ActivityEvent::UserDeleted => ":issuer deleted user :target",
        ActivityEvent::ClientCreated => ":issuer created client :target",
        ActivityEvent::ClientUpdated => ":issuer updated client :target",
        ActivityEvent::ClientDeleted => ":issuer deleted client :target",
    }
}

/// Placeholder values derived from a property bag.
pub fn replacements(properties: &Value) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();

    if let Some(issuer) = properties.get("issuer") {
        let name = match issuer {
            Value::String(s) => Some(s.clone()),
            other => other.get("name").and_then(as_text),
        };
        if let Some(name) = name {
            out.push(("issuer", name));
        }
    }

    if let Some(target) = ["target", "user", "client"]
        .iter()
        .find_map(|k| properties.get(*k))
        .and_then(display_of)
    {
        out.push(("target", target));
    }

    if let Some(email) = properties
        .get("credentials")
        .and_then(|c| c.get("email"))
        .and_then(as_text)
    {
        out.push(("email", email));
    }

    out
}

/// Name, else email, else id of an entity-ish value.
fn display_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => ["name", "email", "id"]
            .iter()
            .find_map(|k| value.get(*k).and_then(as_text)),
        other => as_text(other),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Substitute `:key` placeholders in one left-to-right pass, trying the
/// longest key first at each `:`. Substituted text is never rescanned and
/// unknown placeholders are left as written.
pub fn render(template: &str, replacements: &[(&str, String)]) -> String {
    let mut ordered: Vec<&(&str, String)> = replacements.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match ordered.iter().find(|(key, _)| after.starts_with(*key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len()..];
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event(key: &str, properties: Value) -> AuditEvent {
        AuditEvent {
            id: "e".to_string(),
            log_name: "impersonation".to_string(),
            event: key.trim_start_matches("activity.").to_string(),
            description: key.to_string(),
            subject: None,
            causer: None,
            properties,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_describe_impersonation() {
        let t = Translator::new("activity", "en");
        let e = event(
            "activity.impersonate.start",
            json!({"issuer": {"name": "Ada"}, "target": "Bob"}),
        );
        assert_eq!(t.describe(&e), "Ada started impersonating Bob");
    }

    #[test]
    fn test_target_fallbacks() {
        let t = Translator::new("activity", "en");

        let by_email = event(
            "activity.user.created",
            json!({"issuer": {"name": "Ada"}, "user": {"email": "bob@example.com", "id": 7}}),
        );
        assert_eq!(t.describe(&by_email), "Ada created user bob@example.com");

        let by_id = event(
            "activity.client.deleted",
            json!({"issuer": {"name": "Ada"}, "client": {"id": 42}}),
        );
        assert_eq!(t.describe(&by_id), "Ada deleted client 42");
    }

    #[test]
    fn test_placeholders_inside_values_are_kept() {
        let t = Translator::new("activity", "en");
        let e = event(
            "activity.impersonate.start",
            json!({"issuer": {"name": "Eve :target"}, "target": "Bob :issuer"}),
        );
        assert_eq!(t.describe(&e), "Eve :target started impersonating Bob :issuer");
    }

    #[test]
    fn test_render_prefers_longest_key() {
        let out = render(
            ":target_name is not :target, :unknown stays",
            &[("target", "T".to_string()), ("target_name", "N".to_string())],
        );
        assert_eq!(out, "N is not T, :unknown stays");
    }

    #[test]
    fn test_credentials_email() {
        let t = Translator::new("activity", "en");
        let e = event(
            "activity.auth.failed",
            json!({"credentials": {"email": "eve@example.com"}}),
        );
        assert_eq!(t.describe(&e), "Failed sign-in attempt for eve@example.com");
    }

    #[test]
    fn test_unknown_key_returns_raw_key() {
        let t = Translator::new("activity", "en");
        let e = event("activity.tasks.moved", json!({}));
        assert_eq!(t.describe(&e), "activity.tasks.moved");
    }

    #[test]
    fn test_locale_fallback() {
        let t = Translator::new("activity", "en").with_catalog(
            "de",
            [("activity.impersonate.leave", ":issuer hat :target verlassen")],
        );
        let leave = event(
            "activity.impersonate.leave",
            json!({"issuer": {"name": "Ada"}, "target": "Bob"}),
        );
        let start = event(
            "activity.impersonate.start",
            json!({"issuer": {"name": "Ada"}, "target": "Bob"}),
        );

        assert_eq!(t.describe_in(&leave, "de"), "Ada hat Bob verlassen");
        assert_eq!(t.describe_in(&start, "de"), "Ada started impersonating Bob");
    }

    #[test]
    fn test_missing_values_leave_placeholders() {
        let t = Translator::new("activity", "en");
        let e = event("activity.impersonate.start", json!({}));
        assert_eq!(t.describe(&e), ":issuer started impersonating :target");
    }

    #[test]
    fn test_render_longest_key_first() {
        let out = render(
            ":targets vs :target",
            &[("target", "T".to_string()), ("targets", "Many".to_string())],
        );
        assert_eq!(out, "Many vs T");
    }
}
