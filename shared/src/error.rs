//! Backend error body
//!
//! The backend answers non-2xx requests with `{"detail": ...}` where the
//! detail is either a plain message or a list of field validation errors.

use serde::{Deserialize, Serialize};

/// Error body returned by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parse an error body; anything that is not JSON is kept as the message
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(text) {
            Ok(body) => body,
            Err(_) if text.trim().is_empty() => Self::default(),
            Err(_) => Self {
                detail: Some(serde_json::Value::String(text.trim().to_string())),
            },
        }
    }

    /// Human-readable message, if the backend gave one
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
