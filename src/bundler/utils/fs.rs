//! File system utilities for packaging.
//!
//! Copies are merge-friendly so a re-run over a partially populated directory
//! succeeds; every failure names the path it happened on.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates `path` and any missing parents. An existing directory is fine.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Removes a file or directory tree if it exists.
pub async fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await.fs_context("removing file", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("reading metadata", path),
    }
}

/// Deletes everything under `path` that can be deleted.
///
/// Tries a whole-tree removal first; if that fails (typically a file held open
/// by a running process) it falls back to removing entry by entry and returns
/// every path it had to leave behind. Never fails.
pub async fn remove_dir_best_effort(path: &Path) -> Vec<(PathBuf, io::Error)> {
    match fs::remove_dir_all(path).await {
        Ok(()) => return Vec::new(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => log::debug!(
            "Whole-tree removal of {} failed ({e}), removing entry by entry",
            path.display()
        ),
    }

    let root = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut leftovers = Vec::new();
        for entry in walkdir::WalkDir::new(&root).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let p = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    leftovers.push((p, io::Error::other(e.to_string())));
                    continue;
                }
            };
            let result = if entry.file_type().is_dir() {
                std::fs::remove_dir(entry.path())
            } else {
                std::fs::remove_file(entry.path())
            };
            match result {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                // A directory left non-empty by a locked child is already reported.
                Err(_) if entry.file_type().is_dir() && has_leftover_child(&leftovers, entry.path()) => {}
                Err(e) => leftovers.push((entry.path().to_path_buf(), e)),
            }
        }
        leftovers
    })
    .await
    .unwrap_or_else(|e| vec![(path.to_path_buf(), io::Error::other(e.to_string()))])
}

fn has_leftover_child(leftovers: &[(PathBuf, io::Error)], dir: &Path) -> bool {
    leftovers.iter().any(|(p, _)| p.starts_with(dir))
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary. An existing destination
/// file is replaced.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    let meta = fs::metadata(from).await.fs_context("reading metadata", from)?;
    if !meta.is_file() {
        return Err(Error::FilesystemError {
            op: "copying file".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)
}

/// Recursively copies a directory, merging into `to` if it already exists.
///
/// Preserves symlinks on Unix. Returns the destination path of every regular
/// file written, in traversal order (sorted by file name).
pub async fn copy_dir(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(from).await.fs_context("reading metadata", from)?;
    if !meta.is_dir() {
        return Err(Error::FilesystemError {
            op: "copying directory".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || copy_dir_blocking(&from, &to))
        .await
        .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {e}")))?
}

fn copy_dir_blocking(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for entry in walkdir::WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::FilesystemError {
            op: "walking directory".to_string(),
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| from.to_path_buf()),
            source: io::Error::other(e.to_string()),
        })?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::GenericError(e.to_string()))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            written.push(dest_path);
        }
    }
    Ok(written)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = std::fs::read_link(src).fs_context("reading symlink", src)?;
    match std::fs::symlink_metadata(dst) {
        Ok(_) => std::fs::remove_file(dst).fs_context("replacing symlink", dst)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).fs_context("reading metadata", dst),
    }
    std::os::unix::fs::symlink(&target, dst).fs_context("creating symlink", dst)
}

/// Symlinks are followed on platforms without cheap symlink creation.
#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir_blocking(src, dst).map(|_| ())
    } else {
        std::fs::copy(src, dst).fs_context("copying file", src).map(|_| ())
    }
}

/// Marks `path` executable (0755) on Unix; no-op elsewhere.
pub async fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("setting permissions", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_dir_merges_into_existing_destination() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("y")).unwrap();
        std::fs::write(src.path().join("x"), b"x").unwrap();
        std::fs::write(src.path().join("y/z"), b"zz").unwrap();
        std::fs::create_dir_all(dst.path().join("y")).unwrap();
        std::fs::write(dst.path().join("y/keep"), b"k").unwrap();
        std::fs::write(dst.path().join("x"), b"old").unwrap();

        let written = copy_dir(src.path(), dst.path()).await.unwrap();

        assert_eq!(written, [dst.path().join("x"), dst.path().join("y/z")]);
        assert_eq!(std::fs::read(dst.path().join("x")).unwrap(), b"x");
        assert!(dst.path().join("y/keep").exists());
    }

    #[tokio::test]
    async fn copy_file_rejects_directories() {
        let src = tempfile::tempdir().unwrap();
        let err = copy_file(src.path(), &src.path().join("out")).await.unwrap_err();
        assert!(matches!(err, Error::FilesystemError { .. }));
    }

    #[tokio::test]
    async fn best_effort_removal_of_missing_dir_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_dir_best_effort(&dir.path().join("absent")).await.is_empty());
    }

    #[tokio::test]
    async fn best_effort_removal_deletes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("build");
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/b/c"), b"c").unwrap();
        assert!(remove_dir_best_effort(&root).await.is_empty());
        assert!(!root.exists());
    }
}
