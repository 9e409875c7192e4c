#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower::ServiceExt;

use presenta_api::auth::jwt::{generate_access_token, JwtConfig};
use presenta_api::config::ServerConfig;
use presenta_api::router::build_app_router;
use presenta_api::state::AppState;
use presenta_core::permissions::RolePermissions;
use presenta_core::record::{InMemoryRecordStore, RecordData};
use presenta_engine::{JobEngine, JobRegistry};
use presenta_pipeline::example::register_builtin_pipelines;
use presenta_pipeline::PipelineRegistry;

/// Build a test `ServerConfig` with safe defaults and the given scratch root.
pub fn test_config(scratch_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        scratch_root: scratch_root.to_path_buf(),
        presentation_permissions: HashMap::new(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A fully wired application plus the guards that keep its worker and
/// scratch directory alive for the duration of a test.
pub struct TestApp {
    pub app: Router,
    pub config: ServerConfig,
    _scratch: tempfile::TempDir,
    _worker: DropGuard,
}

/// Build the application with in-memory stores, a running deferred worker,
/// and the full middleware stack.
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses. The record store is seeded with record `R1`.
pub fn build_test_app() -> TestApp {
    build_test_app_with_permissions(HashMap::new())
}

/// Like [`build_test_app`], with per-presentation permission overrides.
pub fn build_test_app_with_permissions(
    presentation_permissions: HashMap<String, Vec<String>>,
) -> TestApp {
    let scratch = tempfile::tempdir().expect("failed to create scratch tempdir");
    let mut config = test_config(scratch.path());
    config.presentation_permissions = presentation_permissions;

    let pipelines = Arc::new(PipelineRegistry::new());
    register_builtin_pipelines(&pipelines, &config.presentation_permissions);

    let records = Arc::new(InMemoryRecordStore::new());
    records.insert(RecordData {
        id: "R1".to_string(),
        metadata: serde_json::json!({ "title": "First record" }),
    });

    let jobs = Arc::new(JobRegistry::new());
    let (engine, worker) = JobEngine::new(
        config.scratch_root.clone(),
        pipelines,
        jobs,
        Arc::new(RolePermissions),
        records,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(worker.run(cancel.clone()));

    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
    };
    let app = build_app_router(state, &config);

    TestApp {
        app,
        config,
        _scratch: scratch,
        _worker: cancel.drop_guard(),
    }
}

/// Mint a Bearer token for `user_id` carrying the given roles.
pub fn token_for(user_id: &str, roles: &[&str], config: &ServerConfig) -> String {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    generate_access_token(user_id, None, &roles, &config.jwt)
        .expect("token generation should succeed")
}

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should not fail at the transport level")
}

/// Send a bodyless request, optionally with a Bearer token.
pub async fn request(app: Router, method: Method, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).expect("request should build"))
        .await
        .expect("request should not fail at the transport level")
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be valid JSON")
}
