//! Standard response envelope
//!
//! Every endpoint, success or failure, answers with the same shape:
//! `{ success, message, data, error, timestamp }`. The `error` field holds a
//! stable machine-readable code; `message` is for humans.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T = serde_json::Value> {
    pub success: bool,

    pub message: Option<String>,

    pub data: Option<T>,

    /// Stable error code, present only on failures.
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl Envelope<serde_json::Value> {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(code.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let envelope = Envelope::ok(serde_json::json!({ "exists": true }));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["exists"], true);
        // All five fields serialize even when unset, so the shape is stable.
        let object = json.as_object().unwrap();
        assert!(object.contains_key("message"));
        assert_eq!(json["message"], serde_json::Value::Null);
        assert_eq!(json["error"], serde_json::Value::Null);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn error_envelope_carries_a_stable_code() {
        let envelope = Envelope::error("NOT_FOUND", "project 'X' was not found");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "NOT_FOUND");
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["message"], "project 'X' was not found");
    }
}
