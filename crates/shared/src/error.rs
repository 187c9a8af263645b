use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload the service returns alongside a non-success status.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ServiceErrorBody {
    /// Fallback for responses whose body is not the structured error JSON.
    pub fn opaque(message: impl Into<String>) -> Self {
        Self {
            code: "Unknown".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_error_json() {
        let body: ServiceErrorBody =
            serde_json::from_str(r#"{"code":"Conflict","message":"Resource already exists"}"#)
                .unwrap();
        assert_eq!(body.code, "Conflict");
        assert_eq!(body.to_string(), "Conflict: Resource already exists");
    }

    #[test]
    fn tolerates_missing_fields() {
        let body: ServiceErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.code.is_empty());
    }
}
