//! The HTTP transport: a thin collaborator that only calls the core and
//! serializes its result (spec §1, §6). Holds no state of its own.

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

/// Builds the router exposing `POST /api/analyze`, `POST /api/analyze_block`,
/// and `GET /api/health` (spec §1, §6.6).
pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/analyze_block", post(handlers::analyze_block))
}

/// Binds and serves the router on `port` until the process is terminated.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router()).await
}
