//! Error types for Staybook server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error codes returned to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    Duplicate = 6,
    DatesUnavailable = 7,
    InvalidAction = 8,
    PreconditionFailed = 9,
    AlreadySet = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested dates overlap a committed range
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A unique value (such as an email) is already taken
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Already set: {0}")]
    AlreadySet(String),

    /// A concurrent writer changed the property first; the caller may retry.
    #[error("Stale write: {0}")]
    StaleWrite(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::DatesUnavailable, msg.clone())
            }
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::InvalidAction(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidAction, msg.clone())
            }
            AppError::PreconditionFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::PreconditionFailed,
                msg.clone(),
            ),
            AppError::AlreadySet(msg) => (StatusCode::CONFLICT, ErrorCode::AlreadySet, msg.clone()),
            AppError::StaleWrite(msg) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_distinct_statuses() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::InvalidAction("x".into()), StatusCode::BAD_REQUEST),
            (AppError::PreconditionFailed("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::AlreadySet("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_duplicate_and_date_conflict_have_distinct_codes() {
        let (status, code, _) = AppError::Duplicate("Email already exists".into()).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, ErrorCode::Duplicate);

        let (status, code, _) = AppError::Conflict("overlaps".into()).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, ErrorCode::DatesUnavailable);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let (status, code, message) = AppError::StaleWrite("version 3 != 4".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, ErrorCode::Failure);
        assert_eq!(message, "Internal server error");
    }
}
