//! Deterministic zip archives.
//!
//! Members are regular files only, in file-name order, with `/` separators, a
//! fixed timestamp (1980-01-01) and fixed permissions. The same tree always
//! yields the same bytes.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

/// Zips the contents of `source` into `destination`.
///
/// Member names are relative to `source`. Returns the member names written.
pub async fn create_archive(source: &Path, destination: &Path) -> Result<Vec<String>> {
    let meta = tokio::fs::metadata(source)
        .await
        .fs_context("reading archive source", source)?;
    if !meta.is_dir() {
        return Err(Error::AssemblyFailed {
            reason: format!("archive source {} is not a directory", source.display()),
        });
    }
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating archive directory", parent)?;
    }

    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || write_archive(&source, &destination))
        .await
        .map_err(|e| Error::GenericError(format!("archive task panicked: {e}")))?
}

fn write_archive(source: &Path, destination: &Path) -> Result<Vec<String>> {
    let mut members: Vec<(String, PathBuf, u32)> = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::FilesystemError {
            op: "walking archive source".to_string(),
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf()),
            source: io::Error::other(e.to_string()),
        })?;
        if !entry.file_type().is_file() || entry.path() == destination {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::GenericError(e.to_string()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        members.push((name, entry.path().to_path_buf(), mode_for(entry.path())?));
    }

    let file = File::create(destination).fs_context("creating archive", destination)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    for (name, path, mode) in &members {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(*mode);
        zip.start_file(name.as_str(), options).map_err(zip_error)?;
        let mut input = File::open(path).fs_context("reading archive member", path)?;
        io::copy(&mut input, &mut zip).fs_context("writing archive member", path)?;
    }
    zip.finish()
        .map_err(zip_error)?
        .into_inner()
        .map_err(|e| e.into_error())
        .fs_context("flushing archive", destination)?;

    log::debug!("Wrote {} member(s) to {}", members.len(), destination.display());
    Ok(members.into_iter().map(|(name, _, _)| name).collect())
}

/// 0755 for executables, 0644 for everything else.
#[cfg(unix)]
fn mode_for(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)
        .fs_context("reading archive member", path)?
        .permissions()
        .mode();
    Ok(if mode & 0o111 != 0 { 0o755 } else { 0o644 })
}

#[cfg(not(unix))]
fn mode_for(path: &Path) -> Result<u32> {
    let executable = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("exe") || e.eq_ignore_ascii_case("bat"));
    Ok(if executable { 0o755 } else { 0o644 })
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::AssemblyFailed {
        reason: format!("zip: {e}"),
    }
}
