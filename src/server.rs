//! HTTP server assembly.
//!
//! Thin composition layer: the build endpoint, the liveness probe, and
//! static serving of the public root. All build semantics live in
//! [`crate::pipeline`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::routes;

/// Liveness payload for `GET /healthz`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Shared application state for request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Liveness check. Shallow by design; it does not probe the toolchain.
async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Builds the application router.
///
/// Requests that match no route fall through to static serving of the
/// public root, which is where published previews live.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit;
    let public_root = state.config.public_root.clone();

    Router::new()
        .route("/healthz", get(healthz))
        .route("/build", post(routes::build::handle_build))
        .layer(DefaultBodyLimit::max(body_limit))
        .fallback_service(ServeDir::new(public_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured port and serves until the process exits.
pub async fn serve(config: Config) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "previewd listening");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
