use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Mount presentation routes (nested under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/presentations/prepare/{presentation}/{record_id}",
            post(handlers::presentation::prepare_presentation),
        )
        .route(
            "/presentations/status/{job_id}",
            get(handlers::presentation::presentation_status),
        )
        .route(
            "/presentations/download/{job_id}",
            get(handlers::presentation::download_presentation),
        )
}
