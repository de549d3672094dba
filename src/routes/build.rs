//! `POST /build` handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::pipeline::BuildPipeline;
use crate::server::AppState;

/// Request body for `POST /build`.
///
/// Both fields are optional at the wire level so that a missing field maps
/// to the 400 validation error instead of a framework-level deserialization
/// failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub project_id: Option<String>,
    pub zip_base64: Option<String>,
}

/// Success body for `POST /build`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub success: bool,
    pub message: String,
    pub preview_url: String,
}

/// Accepts an uploaded project archive, builds it, publishes the artifact,
/// and reports where the preview is served. Every pipeline failure is
/// converted to the structured JSON error body by [`BuildError`].
pub async fn handle_build(
    State(state): State<AppState>,
    Json(request): Json<BuildRequest>,
) -> Result<Json<BuildResponse>, BuildError> {
    let pipeline = BuildPipeline::new(&state.config);
    let outcome = pipeline
        .run(request.project_id.as_deref(), request.zip_base64.as_deref())
        .await?;

    Ok(Json(BuildResponse {
        success: true,
        message: "Build completed".to_string(),
        preview_url: outcome.preview_url,
    }))
}
