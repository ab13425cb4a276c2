//! Log redaction for structured payloads.
//!
//! Any object key whose lower-cased name contains one of the sensitive
//! fragments has its value replaced by [`REDACTION_MARKER`], at any depth.
//! Everything else is copied through unchanged; the input is never mutated.

use serde_json::{Map, Value};

/// Replacement value for sensitive fields.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Case-insensitive key fragments that mark a field as sensitive.
const SENSITIVE_KEY_FRAGMENTS: [&str; 8] = [
    "secret",
    "password",
    "pin",
    "cvv",
    "card_number",
    "account_number",
    "bvn",
    "token",
];

/// Returns true if a field with this name must never be logged in clear text.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Returns a copy of `payload` with every sensitive field redacted.
///
/// Arrays are walked so objects nested inside them are redacted too;
/// scalars outside a sensitive key pass through untouched.
pub fn redact(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(redact_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Object form of [`redact`].
pub fn redact_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key) {
                Value::String(REDACTION_MARKER.to_string())
            } else {
                redact(value)
            };
            (key.clone(), value)
        })
        .collect()
}
