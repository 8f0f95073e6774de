//! Common Error Types
//!
//! Unified handler error with HTTP status mapping. Every failure leaves the
//! server as `{"detail": "<message>"}`.

use std::fmt;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gbridge_protocol::ErrorBody;

/// Error kinds surfaced by the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or missing request parameter
    BadRequest,
    /// API key missing or wrong
    Unauthorized,
    /// No token file on disk; the user must authorize first
    TokenNotFound,
    /// Token file present but unreadable or incomplete
    TokenInvalidFormat,
    /// Required server configuration (API key, client secrets) absent
    ConfigMissing,
    /// Google (or another upstream) call failed
    Upstream,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized | ErrorCode::TokenNotFound => StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalidFormat
            | ErrorCode::ConfigMissing
            | ErrorCode::Upstream
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error type with HTTP status mapping
#[derive(Debug)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// The token file does not exist.
    pub fn token_not_found() -> Self {
        Self::new(
            ErrorCode::TokenNotFound,
            "Token not found. Authenticate via /authenticate.",
        )
    }

    pub fn token_invalid_format(reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TokenInvalidFormat,
            format!("Token file is invalid: {}", reason),
        )
    }

    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Vendor failure, prefixed with what the handler was doing.
    pub fn upstream(context: &str, err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Upstream, format!("{}: {}", context, err))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status().as_u16(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "{}", self.message);
        } else {
            tracing::warn!(code = ?self.code, "{}", self.message);
        }
        (status, Json(ErrorBody { detail: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::token_not_found().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::token_invalid_format("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::config_missing("Server configuration error: API_KEY not set").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_inlines_context() {
        let err = AppError::upstream("Error reading emails", "Google API error 403: Forbidden");
        assert_eq!(err.message, "Error reading emails: Google API error 403: Forbidden");
        assert_eq!(err.to_string(), "[500] Error reading emails: Google API error 403: Forbidden");
    }
}
