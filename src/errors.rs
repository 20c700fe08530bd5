use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Stable, machine-readable error codes returned in `{"code": ..., "message": ...}`.
pub mod error_code {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Errors produced by the session registry and its HTTP surface.
///
/// No variant is fatal: the registry stays usable after any failed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Missing or malformed required input. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// The referenced session was never created, was logged out, or was reaped. HTTP 404.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Unexpected failure in the storage layer. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => error_code::VALIDATION_FAILED,
            SessionError::NotFound(_) => error_code::NOT_FOUND,
            SessionError::Internal(_) => error_code::INTERNAL,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for SessionError {
    fn from(rejection: JsonRejection) -> Self {
        SessionError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for SessionError {
    fn from(rejection: QueryRejection) -> Self {
        SessionError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs
        let message = match &self {
            SessionError::Internal(detail) => {
                error!("Internal error while handling session request: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": self.error_code(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            SessionError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SessionError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SessionError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            SessionError::Validation("x".into()).error_code(),
            "VALIDATION_FAILED"
        );
        assert_eq!(SessionError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(SessionError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn test_not_found_message_names_session() {
        let err = SessionError::NotFound("abc".into());
        assert_eq!(err.to_string(), "session not found: abc");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = SessionError::Internal("lock poisoned at shard 3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["message"], "Internal server error");
    }
}
