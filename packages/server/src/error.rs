use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::runner::RunnerError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `INVALID_INPUT`, `INVALID_TEST_CASE`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `FORBIDDEN`,
    /// `NOT_FOUND`, `CONFLICT`, `INVALID_PHASE`, `USERNAME_TAKEN`,
    /// `RUNNER_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_INPUT")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
    /// Internal error detail, only present in debug builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidTestCase(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// The challenge is not in a phase that allows the operation.
    InvalidPhase(String),
    UsernameTaken,
    RunnerUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, detail) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::InvalidTestCase(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_TEST_CASE", msg, None)
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired session".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::InvalidPhase(msg) => (StatusCode::CONFLICT, "INVALID_PHASE", msg, None),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username or email is already taken".into(),
                None,
            ),
            AppError::RunnerUnavailable(msg) => {
                tracing::warn!("Code runner unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RUNNER_UNAVAILABLE",
                    "Code execution is currently unavailable".into(),
                    cfg!(debug_assertions).then_some(msg),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    cfg!(debug_assertions).then_some(detail),
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
                detail,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RunnerError> for AppError {
    fn from(err: RunnerError) -> Self {
        AppError::RunnerUnavailable(err.to_string())
    }
}
