//! Archive payload decoding and extraction.
//!
//! The uploaded payload is a base64-encoded zip. It is written verbatim to
//! `project.zip` inside the staging directory and then expanded in place,
//! preserving the archive's internal structure. Archive contents are
//! untrusted: entry names that would resolve outside the staging directory
//! fail the extraction.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine as _, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;
use zip::ZipArchive;

use crate::error::BuildError;

/// Fixed name of the uploaded archive inside the staging directory.
pub const ARCHIVE_FILE_NAME: &str = "project.zip";

/// Standard-alphabet engine tolerant of irregular padding. Uploads come from
/// a variety of clients and strict padding checks reject otherwise usable
/// payloads.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes `zip_base64` and expands the archive into `dest`.
///
/// `dest` must already exist. Decode and extraction failures surface as
/// [`BuildError::Extraction`]; partially extracted content may remain in
/// `dest` and is the staging cleanup's problem.
pub async fn unpack_project(zip_base64: &str, dest: &Path) -> Result<(), BuildError> {
    let bytes = LENIENT_STANDARD
        .decode(zip_base64.trim())
        .map_err(|e| BuildError::Extraction(format!("invalid base64 payload: {e}")))?;

    debug!(bytes = bytes.len(), dest = %dest.display(), "decoded archive payload");

    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let zip_path = dest.join(ARCHIVE_FILE_NAME);
        fs::write(&zip_path, &bytes).map_err(|e| {
            BuildError::Extraction(format!("failed to write {}: {e}", zip_path.display()))
        })?;
        extract_zip(&zip_path, &dest)
    })
    .await
    .map_err(|e| BuildError::Extraction(format!("extraction task failed: {e}")))?
}

/// Expands `archive_path` into `dest`, entry by entry.
fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), BuildError> {
    let file = File::open(archive_path)
        .map_err(|e| BuildError::Extraction(format!("failed to open archive: {e}")))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| BuildError::Extraction(format!("not a valid zip archive: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| BuildError::Extraction(format!("failed to read zip entry {i}: {e}")))?;

        // enclosed_name rejects absolute paths and `..` components, so an
        // entry can never write outside the staging directory.
        let Some(rel) = entry.enclosed_name() else {
            return Err(BuildError::Extraction(format!(
                "archive entry {:?} escapes the destination directory",
                entry.name()
            )));
        };

        let dest_path = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| {
                BuildError::Extraction(format!("failed to create {}: {e}", dest_path.display()))
            })?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BuildError::Extraction(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut out = File::create(&dest_path).map_err(|e| {
            BuildError::Extraction(format!("failed to create {}: {e}", dest_path.display()))
        })?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            BuildError::Extraction(format!("failed to write {}: {e}", dest_path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode));
            }
        }
    }

    Ok(())
}
