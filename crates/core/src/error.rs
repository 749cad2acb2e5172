//! Error taxonomy for backend calls.
//!
//! The resource layer passes backend error bodies through untouched;
//! turning a body into user-facing text happens in exactly one place,
//! [`backend_message`], with a fixed precedence over the shapes the
//! backend has been observed to return.

use serde_json::Value;
use thiserror::Error;

/// Result alias used across the resource layer.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surfaced by a backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: timeout, refused connection, malformed body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend rejected the token. The session has already been cleared
    /// globally by the time callers see this.
    #[error("authentication required")]
    Unauthorized,
    /// Structured rejection (validation or business rule) with the raw body.
    #[error("backend returned {status}: {}", backend_message(.body))]
    Backend {
        /// HTTP status code of the response.
        status: u16,
        /// Raw response body, `Value::Null` when it was not JSON.
        body: Value,
    },
}

impl ApiError {
    /// Short message suitable for a status line or toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "action failed: could not reach the server".to_string(),
            ApiError::Unauthorized => "session expired, please log in again".to_string(),
            ApiError::Backend { body, .. } => backend_message(body),
        }
    }
}

/// Keys consulted before falling back to field-keyed extraction, in order.
const MESSAGE_KEYS: [&str; 3] = ["error", "detail", "non_field_errors"];

/// Extract a displayable message from a backend error body.
///
/// Precedence, first match wins:
/// 1. a plain string body;
/// 2. an `error` key;
/// 3. a `detail` key;
/// 4. the first entry of `non_field_errors`;
/// 5. every remaining field rendered as `Field Name: message`, fields in
///    sorted order so the output is deterministic;
/// 6. a compact dump of the raw JSON.
pub fn backend_message(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            for key in MESSAGE_KEYS {
                if let Some(value) = map.get(key) {
                    if let Some(text) = leaf_text(value) {
                        return text;
                    }
                }
            }

            let mut fields: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(key, _)| !MESSAGE_KEYS.contains(&key.as_str()))
                .collect();
            fields.sort_by_key(|(key, _)| key.as_str());

            let rendered: Vec<String> = fields
                .iter()
                .filter_map(|(key, value)| {
                    leaf_text(value).map(|text| format!("{}: {text}", field_label(key)))
                })
                .collect();
            if !rendered.is_empty() {
                return rendered.join("; ");
            }

            body.to_string()
        }
        Value::Null => "action failed".to_string(),
        other => other.to_string(),
    }
}

/// First human-readable string inside a value: the string itself or the
/// leading element of an array of strings.
fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items.first().and_then(leaf_text),
        _ => None,
    }
}

/// `first_name` -> `First Name`.
fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_body_passes_through() {
        assert_eq!(backend_message(&json!("card already assigned")), "card already assigned");
    }

    #[test]
    fn error_key_wins_over_detail() {
        let body = json!({"detail": "second", "error": "first"});
        assert_eq!(backend_message(&body), "first");
    }

    #[test]
    fn detail_wins_over_non_field_errors() {
        let body = json!({"non_field_errors": ["later"], "detail": "sooner"});
        assert_eq!(backend_message(&body), "sooner");
    }

    #[test]
    fn non_field_errors_takes_first_entry() {
        let body = json!({"non_field_errors": ["insufficient balance", "ignored"]});
        assert_eq!(backend_message(&body), "insufficient balance");
    }

    #[test]
    fn field_errors_render_per_field_in_sorted_order() {
        let body = json!({
            "phone": ["already exists"],
            "first_name": "may not be blank"
        });
        assert_eq!(
            backend_message(&body),
            "First Name: may not be blank; Phone: already exists"
        );
    }

    #[test]
    fn unknown_shape_falls_back_to_raw_dump() {
        let body = json!({"weird": {"nested": 1}});
        assert_eq!(backend_message(&body), body.to_string());
    }

    #[test]
    fn null_body_has_generic_message() {
        assert_eq!(backend_message(&Value::Null), "action failed");
    }
}
