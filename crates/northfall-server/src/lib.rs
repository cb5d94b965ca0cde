pub mod error;
pub mod executor;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use northfall_core::config::ExecutorConfig;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf, executor: ExecutorConfig) -> Router {
    let app_state = state::AppState::new(root, executor);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Jobs
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/ws", get(routes::jobs::job_socket))
        .route("/api/jobs/{job_id}", get(routes::jobs::get_job))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the job server on `0.0.0.0:{port}`.
pub async fn serve(root: PathBuf, port: u16, executor: ExecutorConfig) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener, executor).await
}

/// Start the job server on a pre-bound listener.
///
/// Lets the caller read the actual port before starting (useful when
/// `port = 0` and the OS picks a free port).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    executor: ExecutorConfig,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root, executor);

    tracing::info!("Northfall job server listening on ws://localhost:{actual_port}/api/jobs/ws");

    axum::serve(listener, app).await?;
    Ok(())
}
