//! Artifact publication.
//!
//! Copies the toolchain's artifact tree under the public root, where the
//! static file layer serves it. Publication is idempotent per identifier:
//! existing files are overwritten, so the last completed build wins. A copy
//! that fails partway may leave the destination partially updated; there is
//! no rollback.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::BuildError;

/// Subdirectory of the public root holding published previews.
pub const PREVIEW_DIR: &str = "preview";

/// Copies the artifact tree to `<public_root>/preview/<project_id>`,
/// creating destination directories as needed. Returns the published path.
pub async fn publish_artifact(
    artifact: &Path,
    public_root: &Path,
    project_id: &str,
) -> Result<PathBuf, BuildError> {
    let dest = public_root.join(PREVIEW_DIR).join(project_id);
    let src = artifact.to_path_buf();
    let copy_dest = dest.clone();

    tokio::task::spawn_blocking(move || copy_tree(&src, &copy_dest))
        .await
        .map_err(|e| BuildError::Publish(format!("publish task failed: {e}")))??;

    debug!(dest = %dest.display(), "artifact published");
    Ok(dest)
}

/// Recursively copies `src` into `dest`, preserving relative structure and
/// overwriting existing files.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.map_err(|e| BuildError::Publish(format!("failed to walk artifact tree: {e}")))?;
        let rel = entry.path().strip_prefix(src).map_err(|e| {
            BuildError::Publish(format!("unexpected path {}: {e}", entry.path().display()))
        })?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                BuildError::Publish(format!("failed to create {}: {e}", target.display()))
            })?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::Publish(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
            fs::copy(entry.path(), &target).map_err(|e| {
                BuildError::Publish(format!(
                    "failed to copy {} to {}: {e}",
                    entry.path().display(),
                    target.display()
                ))
            })?;
        }
    }
    Ok(())
}
