use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),

    #[error("Result too large: {0}")]
    ResultTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Nothing to run: {0}")]
    UserInputEmpty(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Query rejected: {0}")]
    Rejected(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::RemoteUnreachable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "REMOTE_UNREACHABLE",
                    "The data catalog could not be reached. Please try again later.",
                )
                .with_details(msg),
            ),
            AppError::ResultTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorDetail::new(
                    "RESULT_TOO_LARGE",
                    "The result is probably too big to be displayed. Please use the query worksheet instead.",
                )
                .with_details(msg),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", msg),
            ),
            AppError::UserInputEmpty(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("USER_INPUT_EMPTY", msg),
            ),
            AppError::Filesystem(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("FILESYSTEM_ERROR", msg),
            ),
            AppError::InvalidSql(msg) => {
                let enhanced_msg = format!(
                    "{} Only read queries can be previewed. Use a SQL submission to materialize results.",
                    msg
                );
                (
                    StatusCode::BAD_REQUEST,
                    ErrorDetail::new("INVALID_SQL", enhanced_msg),
                )
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg),
            ),
            AppError::Rejected(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("QUERY_REJECTED", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_detail,
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Filesystem(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Internal(format!("Failed to serialize project manifest: {}", err))
    }
}

/// Classify transport-level failures from the catalog HTTP client
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Internal(format!("Malformed catalog response: {}", err))
        } else {
            AppError::RemoteUnreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_format() {
        let error = AppError::NotFound("Branch alice.dev not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_remote_errors_map_to_distinct_statuses() {
        let unreachable = AppError::RemoteUnreachable("connection refused".to_string());
        assert_eq!(unreachable.into_response().status(), StatusCode::BAD_GATEWAY);

        let too_large = AppError::ResultTooLarge("120000 rows".to_string());
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_io_error_becomes_filesystem_error() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, AppError::Filesystem(_)));
    }

    #[test]
    fn test_error_detail_creation() {
        let detail = ErrorDetail::new("TEST_CODE", "Test message").with_details("extra");
        assert_eq!(detail.code, "TEST_CODE");
        assert_eq!(detail.message, "Test message");
        assert_eq!(detail.details.as_deref(), Some("extra"));
    }
}
