//! Sensitive-field redaction for captured request payloads.

use serde_json::Value;

/// Marker substituted for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Key terms that mark a field as sensitive. Matching is by lowercase
/// containment, which deliberately errs toward over-redaction.
const SENSITIVE_KEY_TERMS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "key",
    "credential",
    "accesstoken",
    "refreshtoken",
    "auth",
    "jwt",
    "session",
    "cookie",
    "csrf",
    "ssn",
    "cc",
    "card",
    "cvv",
    "pin",
];

/// Whether a key names a sensitive field.
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEY_TERMS.iter().any(|term| lowered.contains(term))
}

/// Replace the values of sensitive keys with the redaction marker.
///
/// Nested objects are walked recursively; arrays and primitives pass
/// through unless caught by a key match at an enclosing level.
pub fn redact_value(value: &mut Value) {
    if let Value::Object(map) = value {
        for (key, entry) in map.iter_mut() {
            if is_sensitive_key(key) {
                *entry = Value::String(REDACTED.to_string());
            } else if entry.is_object() {
                redact_value(entry);
            }
        }
    }
}

/// Owned-value convenience form of [`redact_value`].
pub fn redacted(mut value: Value) -> Value {
    redact_value(&mut value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_sensitive_keys_at_every_depth() {
        let sanitized = redacted(json!({
            "password": "p1",
            "nested": {"token": "t1", "ok": "v"}
        }));
        assert_eq!(
            sanitized,
            json!({
                "password": "[REDACTED]",
                "nested": {"token": "[REDACTED]", "ok": "v"}
            })
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_by_containment() {
        let sanitized = redacted(json!({
            "AccessToken": "t",
            "user_api_key": "k",
            "Authorization": "Bearer x",
            "username": "alice"
        }));
        assert_eq!(sanitized["AccessToken"], json!("[REDACTED]"));
        assert_eq!(sanitized["user_api_key"], json!("[REDACTED]"));
        assert_eq!(sanitized["Authorization"], json!("[REDACTED]"));
        assert_eq!(sanitized["username"], json!("alice"));
    }

    #[test]
    fn sensitive_key_redacts_whole_subtree() {
        let sanitized = redacted(json!({
            "credentials": {"user": "u", "password": "p"}
        }));
        assert_eq!(sanitized["credentials"], json!("[REDACTED]"));
    }

    #[test]
    fn arrays_and_primitives_pass_through() {
        let sanitized = redacted(json!({
            "items": [1, 2, 3],
            "count": 3,
            "tags": ["a", "b"]
        }));
        assert_eq!(sanitized["items"], json!([1, 2, 3]));
        assert_eq!(sanitized["count"], json!(3));
    }
}
