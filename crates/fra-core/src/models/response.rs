use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope shared by every JSON response, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Machine-readable error code; only present on failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One entry of the `errors` list of a failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(
        message: impl Into<String>,
        code: impl Into<String>,
        errors: Vec<FieldError>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: if errors.is_empty() { None } else { Some(errors) },
            code: Some(code.into()),
            timestamp: Utc::now(),
        }
    }
}
