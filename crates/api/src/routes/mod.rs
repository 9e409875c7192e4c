pub mod health;
pub mod presentation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /presentations/prepare/{presentation}/{record_id}   submit job (POST)
/// /presentations/status/{job_id}                      job status (GET)
/// /presentations/download/{job_id}                    artifact download (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(presentation::router())
}
