//! HTTP surface: the single verification page plus its JSON and SSE endpoints.
//!
//! - `GET /` - the page
//! - `POST /api/verify` - run a verification, answer with the full report
//! - `GET /api/verify/stream?statement=..` - same run as server-sent events
//! - `GET /health` - liveness

mod handlers;
pub mod types;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/verify", post(handlers::verify_handler))
        .route("/api/verify/stream", get(handlers::verify_stream_handler))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(addr: &str, state: AppState) -> Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Bind failed on {}", addr))?;

    info!("News verification server listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .context("Server error")
}
