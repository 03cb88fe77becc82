use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the Notes API.
///
/// Cloneable so a single failed fetch can be handed to every caller that
/// attached to the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Note not found: {id}")]
    NotFound { id: String },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        ApiError::NotFound { id: id.into() }
    }

    /// Short name used in logs and JSON error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "NetworkError",
            ApiError::Validation { .. } => "ValidationError",
            ApiError::NotFound { .. } => "NotFoundError",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::network(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum NotehubError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NotehubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_names() {
        assert_eq!(ApiError::network("down").error_type(), "NetworkError");
        assert_eq!(
            ApiError::validation("title", "too short").error_type(),
            "ValidationError"
        );
        assert_eq!(ApiError::not_found("42").error_type(), "NotFoundError");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::validation("title", "Title is required");
        assert_eq!(
            err.to_string(),
            "Validation failed for field 'title': Title is required"
        );
    }

    #[test]
    fn test_api_error_into_notehub_error() {
        let err: NotehubError = ApiError::not_found("abc").into();
        assert!(matches!(err, NotehubError::Api(ApiError::NotFound { ref id }) if id == "abc"));
        assert_eq!(err.to_string(), "Note not found: abc");
    }

    #[test]
    fn test_api_error_json_shape() {
        let json = serde_json::to_value(ApiError::not_found("n1")).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["id"], "n1");
    }
}
