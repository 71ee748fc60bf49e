//! Axum server setup and router configuration.

use crate::shutdown::wait_for_shutdown;
use crate::state::AppState;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use lfg_core::status::EngineStatus;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Read-only engine snapshot
        .route("/status", get(engine_status))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.status())
}

/// Bind the listener. Failing to bind is a startup error.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, std::io::Error> {
    TcpListener::bind(addr).await
}

/// Serve until `shutdown_rx` turns `true`.
pub async fn run_server(
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
}
