//! Artifact verification gate.

use super::{Artifact, checksum::calculate_sha256};
use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::Path;

/// Confirms `expected` is a non-empty regular file and records its checksum.
///
/// A zero-byte file at `expected` is removed before the error is returned, so
/// the output directory never holds a bad artifact that looks complete.
///
/// # Errors
///
/// [`Error::ArtifactNotProduced`] when the path is missing, is not a file, or
/// is empty.
pub async fn verify(expected: &Path, stage: &str) -> Result<Artifact> {
    let not_produced = || Error::ArtifactNotProduced {
        expected_path: expected.to_path_buf(),
    };

    let meta = match tokio::fs::metadata(expected).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_produced()),
        Err(e) => return Err(e).fs_context("reading artifact metadata", expected),
    };

    if !meta.is_file() {
        log::error!("{} exists but is not a file", expected.display());
        return Err(not_produced());
    }

    if meta.len() == 0 {
        log::error!("{} is empty", expected.display());
        if let Err(e) = tokio::fs::remove_file(expected).await {
            log::warn!("Failed to remove empty artifact {}: {e}", expected.display());
        }
        return Err(not_produced());
    }

    let checksum = calculate_sha256(expected).await?;
    log::info!(
        "Verified {} ({} bytes, sha256 {})",
        expected.display(),
        meta.len(),
        checksum
    );
    Ok(Artifact::new(expected.to_path_buf(), meta.len(), checksum, stage))
}
