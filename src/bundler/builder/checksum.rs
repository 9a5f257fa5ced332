//! Artifact checksums and sizes for the build report.
//!
//! Verified executables and setup files are hashed directly. Assembled
//! directories (portable folders, AppDirs) get a tree digest so two runs over
//! identical inputs report the same value.

use crate::bundler::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hex SHA-256 of a file, or of a directory tree.
///
/// # Errors
///
/// [`Error::FilesystemError`] if anything cannot be read,
/// [`Error::GenericError`] for paths that are neither files nor directories.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading metadata for hashing", path)?;

    if metadata.is_file() {
        calculate_file_sha256(path).await
    } else if metadata.is_dir() {
        calculate_directory_sha256(path).await
    } else {
        Err(Error::GenericError(format!(
            "Path is neither file nor directory: {}",
            path.display()
        )))
    }
}

/// Total size in bytes of a file, or of every regular file below a directory.
pub async fn total_size(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading metadata", path)?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut size = 0u64;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| Error::FilesystemError {
            op: "walking directory".to_string(),
            path: path.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?;
        if entry.file_type().is_file() {
            size += entry
                .metadata()
                .map_err(|e| Error::FilesystemError {
                    op: "reading metadata".to_string(),
                    path: entry.path().to_path_buf(),
                    source: std::io::Error::other(e.to_string()),
                })?
                .len();
        }
    }
    Ok(size)
}

async fn hash_file_into(hasher: &mut Sha256, file_path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(())
}

async fn calculate_file_sha256(file_path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    hash_file_into(&mut hasher, file_path).await?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Each file contributes its relative path (with `/` separators) and its
/// content, in sorted path order, so identical trees hash identically on
/// every platform.
async fn calculate_directory_sha256(dir_path: &Path) -> Result<String> {
    let entries = walkdir::WalkDir::new(dir_path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    let mut hasher = Sha256::new();
    for entry in entries {
        if let Ok(rel_path) = entry.path().strip_prefix(dir_path) {
            let rel: Vec<_> = rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            hasher.update(rel.join("/").as_bytes());
            hasher.update([0u8]);
        }
        hash_file_into(&mut hasher, entry.path()).await?;
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_hash_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            calculate_sha256(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn directory_hash_depends_on_layout_not_location() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for root in [a.path(), b.path()] {
            std::fs::create_dir_all(root.join("y")).unwrap();
            std::fs::write(root.join("x"), b"1").unwrap();
            std::fs::write(root.join("y/z"), b"22").unwrap();
        }
        assert_eq!(
            calculate_sha256(a.path()).await.unwrap(),
            calculate_sha256(b.path()).await.unwrap()
        );
        assert_eq!(total_size(a.path()).await.unwrap(), 3);

        std::fs::rename(b.path().join("y/z"), b.path().join("y/w")).unwrap();
        assert_ne!(
            calculate_sha256(a.path()).await.unwrap(),
            calculate_sha256(b.path()).await.unwrap()
        );
    }
}
