//! Staging directory lifecycle.
//!
//! Every build works inside an ephemeral directory under the temporary root.
//! Acquisition appends a random suffix to the project identifier, so two
//! concurrent builds for the same project never share staging state; the
//! published location is still keyed by identifier alone (last build wins).

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BuildError;

/// Ephemeral per-build working directory.
///
/// Call [`release`](Self::release) when the build is finished; dropping an
/// unreleased `StagingDir` removes the directory as a backstop for early
/// exits.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    released: bool,
}

impl StagingDir {
    /// Creates the staging directory for one build.
    ///
    /// Any pre-existing directory at the computed path is force-removed
    /// first; a missing directory is not an error and removal failures are
    /// only logged. Creation failures (permissions, disk full) are fatal
    /// for the request.
    pub async fn acquire(tmp_root: &Path, project_id: &str) -> Result<Self, BuildError> {
        let path = tmp_root.join(format!("{}-{}", project_id, Uuid::new_v4().simple()));

        match fs::remove_dir_all(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to clear stale staging directory");
            }
        }

        fs::create_dir_all(&path)
            .await
            .map_err(|source| BuildError::Staging {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "staging directory created");
        Ok(Self {
            path,
            released: false,
        })
    }

    /// The staging directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the staging directory recursively.
    ///
    /// Errors are swallowed (logged at warn) so that cleanup never masks or
    /// overrides the build outcome already determined.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "staging cleanup failed");
            }
        } else {
            debug!(path = %self.path.display(), "staging directory removed");
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
