//! Handlers for presentation job submission, status lookup, and artifact
//! download.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use presenta_core::sanitize::sanitize_filename;
use presenta_engine::{ExecutionMode, JobId, ResultOutcome};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Streaming chunk size for artifact downloads.
const DOWNLOAD_CHUNK_BYTES: usize = 128 * 1024;

#[derive(Debug, Serialize)]
pub struct PrepareResponse {
    pub job_id: JobId,
}

// ---------------------------------------------------------------------------
// POST /presentations/prepare/{presentation}/{record_id}
// ---------------------------------------------------------------------------

/// Submit a deferred presentation job over a record.
///
/// Returns 202 with the job id; the caller polls the status endpoint or
/// blocks on the download endpoint.
pub async fn prepare_presentation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((presentation, record_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let request_headers = forwardable_headers(&headers);

    let job_id = state
        .engine
        .submit(
            &presentation,
            &record_id,
            user,
            request_headers,
            ExecutionMode::Deferred,
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: PrepareResponse { job_id },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /presentations/status/{job_id}
// ---------------------------------------------------------------------------

/// Report the status of a job the caller owns.
///
/// A job owned by someone else answers exactly like a job that does not
/// exist.
pub async fn presentation_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job_id = parse_job_id(&job_id)?;

    let view = state
        .engine
        .jobs()
        .status(job_id, &user)
        .await
        .ok_or(AppError::JobUnknown)?;

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// GET /presentations/download/{job_id}
// ---------------------------------------------------------------------------

/// Wait for the job to reach a terminal state, then stream its artifact.
///
/// The wait is bounded by the request timeout layer. A terminal job with
/// no artifact (failure, or a pipeline that produced none) answers 409.
pub async fn download_presentation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Response> {
    let job_id = parse_job_id(&job_id)?;

    let result = match state.engine.jobs().await_result(job_id, &user).await {
        ResultOutcome::Ready(result) => result,
        ResultOutcome::NoResult => return Err(AppError::NoResult),
        ResultOutcome::Unknown => return Err(AppError::JobUnknown),
    };

    let file = tokio::fs::File::open(&result.path).await.map_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "Job artifact missing from scratch");
        AppError::InternalError("Job artifact is no longer available".to_string())
    })?;
    let length = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();

    let content_type = HeaderValue::from_str(&result.mimetype)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let filename = sanitize_filename(&result.filename);
    let stream = ReaderStream::with_capacity(file, DOWNLOAD_CHUNK_BYTES);

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An unparseable job id answers like an unknown one.
fn parse_job_id(raw: &str) -> Result<JobId, AppError> {
    raw.parse().map_err(|_| AppError::JobUnknown)
}

/// Header subset handed to pipeline tasks. Credentials never cross the job
/// boundary.
fn forwardable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            name != "authorization" && name != "cookie"
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_stripped_from_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        headers.insert("cookie", "session=abc".parse().unwrap());
        headers.insert("accept-language", "en".parse().unwrap());
        headers.insert("user-agent", "curl/8".parse().unwrap());

        let forwarded = forwardable_headers(&headers);
        assert!(!forwarded.contains_key("authorization"));
        assert!(!forwarded.contains_key("cookie"));
        assert_eq!(forwarded["accept-language"], "en");
        assert_eq!(forwarded["user-agent"], "curl/8");
    }

    #[test]
    fn malformed_job_ids_answer_like_unknown_jobs() {
        assert!(matches!(
            parse_job_id("not-a-uuid"),
            Err(AppError::JobUnknown)
        ));
        let id = JobId::new();
        assert_eq!(parse_job_id(&id.to_string()).unwrap(), id);
    }
}
