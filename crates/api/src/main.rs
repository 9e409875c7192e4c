use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presenta_api::config::ServerConfig;
use presenta_api::router::build_app_router;
use presenta_api::state::AppState;
use presenta_core::permissions::RolePermissions;
use presenta_core::record::{InMemoryRecordStore, RecordData};
use presenta_engine::{JobEngine, JobRegistry};
use presenta_pipeline::example::register_builtin_pipelines;
use presenta_pipeline::PipelineRegistry;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presenta_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    std::fs::create_dir_all(&config.scratch_root).expect("Failed to create scratch root");
    tracing::info!(scratch_root = %config.scratch_root.display(), "Scratch root ready");

    // --- Pipelines ---
    let pipelines = Arc::new(PipelineRegistry::new());
    register_builtin_pipelines(&pipelines, &config.presentation_permissions);
    tracing::info!(pipelines = ?pipelines.names(), "Pipelines registered");

    // --- Records ---
    // Demo store until a host platform wires in its own implementation.
    let records = Arc::new(InMemoryRecordStore::new());
    records.insert(RecordData {
        id: "R1".to_string(),
        metadata: serde_json::json!({ "title": "Demo record" }),
    });

    // --- Engine + worker ---
    let jobs = Arc::new(JobRegistry::new());
    let (engine, worker) = JobEngine::new(
        config.scratch_root.clone(),
        Arc::clone(&pipelines),
        Arc::clone(&jobs),
        Arc::new(RolePermissions),
        records,
    );

    let worker_cancel = CancellationToken::new();
    let worker_handle = tokio::spawn(worker.run(worker_cancel.clone()));
    tracing::info!("Job worker started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    worker_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        worker_handle,
    )
    .await;
    tracing::info!("Job worker stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
