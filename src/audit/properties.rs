//! Property-bag assembly for activity records.
//!
//! Two stages: first the defaults derived from the causer and the request,
//! then the caller's own properties layered on top with [`shallow_merge`].
//! Caller-supplied keys always win, including inside `issuer`.

use serde_json::{Map, Value};

use crate::identity::Principal;
use crate::request::RequestMeta;

/// Copy `base`, then overwrite with every top-level key of `overlay`.
///
/// Nested objects are replaced wholesale, not merged.
pub fn shallow_merge(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Issuer object derived from the causer and request metadata.
pub fn default_issuer(causer: Option<&Principal>, meta: &RequestMeta) -> Map<String, Value> {
    let mut issuer = Map::new();

    if let Some(causer) = causer {
        issuer.insert("name".to_string(), Value::String(causer.name.clone()));
        if let Some(email) = &causer.email {
            issuer.insert("email".to_string(), Value::String(email.clone()));
        }
    }
    if let Some(ip) = &meta.ip {
        issuer.insert("ip".to_string(), Value::String(ip.clone()));
    }
    if let Some(ua) = &meta.user_agent {
        issuer.insert("user_agent".to_string(), Value::String(ua.clone()));
    }

    issuer
}

/// Build the stored property bag.
pub fn build_properties(
    causer: Option<&Principal>,
    meta: &RequestMeta,
    caller: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = shallow_merge(&request_defaults(meta), caller);

    match caller.get("issuer") {
        Some(Value::Object(supplied)) => {
            let issuer = shallow_merge(&default_issuer(causer, meta), supplied);
            merged.insert("issuer".to_string(), Value::Object(issuer));
        }
        // A non-object issuer stays as the caller wrote it.
        Some(_) => {}
        None => {
            let issuer = default_issuer(causer, meta);
            if !issuer.is_empty() {
                merged.insert("issuer".to_string(), Value::Object(issuer));
            }
        }
    }

    merged
}

fn request_defaults(meta: &RequestMeta) -> Map<String, Value> {
    let mut defaults = Map::new();
    if let Some(ip) = &meta.ip {
        defaults.insert("ip".to_string(), Value::String(ip.clone()));
    }
    if let Some(ua) = &meta.user_agent {
        defaults.insert("user_agent".to_string(), Value::String(ua.clone()));
    }
    defaults
}
