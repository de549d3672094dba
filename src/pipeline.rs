//! End-to-end build orchestration.
//!
//! One pipeline run drives a request through validation, staging,
//! extraction, dependency resolution (best-effort), the release build, and
//! publication. Stages are strictly sequential within a request; across
//! requests nothing is serialized. The staging directory is released on
//! every exit path before the outcome is returned.

use std::time::Instant;

use tracing::{info, warn};

use crate::archive;
use crate::config::Config;
use crate::error::BuildError;
use crate::publish;
use crate::sanitize::sanitize_project_id;
use crate::staging::StagingDir;
use crate::toolchain;

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Sanitized identifier the artifact was published under.
    pub project_id: String,
    /// URL path where the preview entry file is served.
    pub preview_url: String,
}

/// Drives one build request from raw input to a published preview.
pub struct BuildPipeline<'a> {
    config: &'a Config,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Runs the full pipeline.
    ///
    /// Validation happens before any filesystem effect; from staging
    /// acquisition onward, cleanup is guaranteed regardless of which stage
    /// fails.
    pub async fn run(
        &self,
        raw_project_id: Option<&str>,
        zip_base64: Option<&str>,
    ) -> Result<BuildOutcome, BuildError> {
        let zip_base64 = match (raw_project_id, zip_base64) {
            (Some(_), Some(payload)) if !payload.is_empty() => payload,
            _ => return Err(BuildError::MissingField),
        };
        let project_id = sanitize_project_id(raw_project_id);

        let start = Instant::now();
        info!(project_id = %project_id, "build request accepted");

        let staging = StagingDir::acquire(&self.config.tmp_root, &project_id).await?;
        let result = self.run_staged(&project_id, zip_base64, &staging).await;
        staging.release().await;

        match &result {
            Ok(outcome) => info!(
                project_id = %project_id,
                preview_url = %outcome.preview_url,
                elapsed = ?start.elapsed(),
                "build complete"
            ),
            Err(e) => warn!(
                project_id = %project_id,
                error = %e,
                elapsed = ?start.elapsed(),
                "build failed"
            ),
        }
        result
    }

    /// The stages that run inside an acquired staging directory.
    async fn run_staged(
        &self,
        project_id: &str,
        zip_base64: &str,
        staging: &StagingDir,
    ) -> Result<BuildOutcome, BuildError> {
        info!(project_id = %project_id, "extracting project archive");
        archive::unpack_project(zip_base64, staging.path()).await?;

        info!(project_id = %project_id, command = %self.config.deps_cmd, "resolving dependencies");
        toolchain::resolve_dependencies(self.config, staging.path()).await;

        info!(project_id = %project_id, command = %self.config.build_cmd, "running release build");
        let artifact = toolchain::build_release(self.config, staging.path()).await?;

        info!(project_id = %project_id, "publishing artifact");
        publish::publish_artifact(&artifact, &self.config.public_root, project_id).await?;

        Ok(BuildOutcome {
            project_id: project_id.to_string(),
            preview_url: format!(
                "/{}/{}/{}",
                publish::PREVIEW_DIR,
                project_id,
                self.config.entry_file
            ),
        })
    }
}
