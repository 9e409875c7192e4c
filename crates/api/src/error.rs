use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use presenta_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `presenta_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Unknown job id, or a job the caller does not own. The two cases are
    /// deliberately indistinguishable in the response.
    #[error("Job not found")]
    JobUnknown,

    /// The job reached a terminal state without a downloadable artifact.
    #[error("Job finished without a downloadable result")]
    NoResult,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotAuthenticated(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::PermissionDenied(msg) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                }
                CoreError::PresentationNotFound { name } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Presentation '{name}' not found"),
                ),
                CoreError::RecordNotFound { id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Record '{id}' not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::OutsideScratch { .. }
                | CoreError::TaskAbort(_)
                | CoreError::Io(_)
                | CoreError::Internal(_) => {
                    tracing::error!(error = %core, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::JobUnknown => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Job not found".to_string(),
            ),
            AppError::NoResult => (
                StatusCode::CONFLICT,
                "NO_RESULT",
                "Job finished without a downloadable result".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
