//! Build pipeline error types and their HTTP response mapping.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body returned for every failed build request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description of the failure.
    pub error: String,
}

/// Everything that can go wrong while handling a build request.
///
/// Each variant maps to exactly one HTTP status: a validation failure is the
/// caller's fault (400), everything downstream is a server-side failure
/// (500). Dependency-resolution failures never appear here; they are logged
/// and the pipeline continues.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Request rejected before any filesystem effect.
    #[error("Missing projectId or zipBase64")]
    MissingField,

    /// Staging directory could not be created.
    #[error("failed to create staging directory {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload decode or zip expansion failed, or an archive entry tried to
    /// escape the staging directory.
    #[error("archive extraction failed: {0}")]
    Extraction(String),

    /// A toolchain invocation produced more captured output than allowed.
    #[error("{stage} output exceeded the {limit} byte capture limit")]
    OutputLimit { stage: &'static str, limit: u64 },

    /// The release-build command failed.
    #[error("build failed: {0}")]
    Build(String),

    /// The build command exited successfully but the artifact tree was not
    /// found on disk.
    #[error("build output not found at {}: the toolchain exited successfully without producing it", .0.display())]
    ArtifactMissing(PathBuf),

    /// Copying the artifact tree to the public root failed.
    #[error("failed to publish artifact: {0}")]
    Publish(String),
}

impl BuildError {
    /// HTTP status code for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField => StatusCode::BAD_REQUEST,
            Self::Staging { .. }
            | Self::Extraction(_)
            | Self::OutputLimit { .. }
            | Self::Build(_)
            | Self::ArtifactMissing(_)
            | Self::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BuildError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
