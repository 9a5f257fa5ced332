//! Icon and installer image preparation.
//!
//! Missing visual assets are a locally recoverable condition: a deterministic
//! solid-colour placeholder of the exact format and size is written instead of
//! failing the build. User-supplied files are never overwritten.

mod desktop;

pub use desktop::{DesktopEntry, write_desktop_entry};

use crate::bundler::{
    builder::{Artifact, checksum::calculate_sha256},
    error::{Error, ErrorExt, Result},
};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::{fmt, path::Path};

/// Placeholder fill colour (RGB).
const PLACEHOLDER_RGB: [u8; 3] = [0x1e, 0x66, 0xd0];

/// Visual assets the targets consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Windows application icon, 256x256 ICO.
    IconIco,
    /// Linux application icon, 256x256 PNG.
    IconPng,
    /// Installer welcome/finish page image, 164x314 BMP.
    WizardSidebar,
    /// Installer page header image, 150x57 BMP.
    WizardHeader,
}

impl AssetKind {
    /// Conventional file name inside the assets directory.
    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::IconIco => "icon.ico",
            AssetKind::IconPng => "icon.png",
            AssetKind::WizardSidebar => "wizard-sidebar.bmp",
            AssetKind::WizardHeader => "wizard-header.bmp",
        }
    }

    /// Required pixel dimensions.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AssetKind::IconIco | AssetKind::IconPng => (256, 256),
            AssetKind::WizardSidebar => (164, 314),
            AssetKind::WizardHeader => (150, 57),
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            AssetKind::IconIco => ImageFormat::Ico,
            AssetKind::IconPng => ImageFormat::Png,
            AssetKind::WizardSidebar | AssetKind::WizardHeader => ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Result of [`ensure`]: the artifact plus whether it was synthesized.
#[derive(Debug, Clone)]
pub struct PreparedAsset {
    pub artifact: Artifact,
    pub synthesized: bool,
}

/// Makes sure `destination` holds an asset of `kind`.
///
/// An existing file is left untouched. Otherwise a placeholder is written,
/// creating parent directories as needed.
///
/// # Errors
///
/// Only filesystem failures, reported as [`Error::FilesystemError`].
pub async fn ensure(kind: AssetKind, destination: &Path, stage: &str) -> Result<PreparedAsset> {
    let synthesized = match tokio::fs::metadata(destination).await {
        Ok(meta) if meta.is_file() => {
            log::debug!("Using existing {kind}: {}", destination.display());
            false
        }
        Ok(_) => {
            return Err(Error::FilesystemError {
                op: format!("preparing {kind}"),
                path: destination.to_path_buf(),
                source: std::io::Error::other("destination exists and is not a file"),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            write_placeholder(kind, destination).await?;
            log::warn!(
                "{kind} not found, wrote {}x{} placeholder to {}",
                kind.dimensions().0,
                kind.dimensions().1,
                destination.display()
            );
            true
        }
        Err(e) => return Err(e).fs_context("reading asset metadata", destination),
    };

    let size = tokio::fs::metadata(destination)
        .await
        .fs_context("reading asset metadata", destination)?
        .len();
    let checksum = calculate_sha256(destination).await?;

    Ok(PreparedAsset {
        artifact: Artifact::new(destination.to_path_buf(), size, checksum, stage),
        synthesized,
    })
}

async fn write_placeholder(kind: AssetKind, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating assets directory", parent)?;
    }

    let (width, height) = kind.dimensions();
    let format = kind.format();
    let path = destination.to_path_buf();
    let [r, g, b] = PLACEHOLDER_RGB;

    // Encoders are synchronous; keep them off the runtime threads.
    tokio::task::spawn_blocking(move || match format {
        ImageFormat::Bmp => RgbImage::from_pixel(width, height, Rgb([r, g, b]))
            .save_with_format(&path, format),
        _ => RgbaImage::from_pixel(width, height, Rgba([r, g, b, 0xff]))
            .save_with_format(&path, format),
    })
    .await
    .map_err(|e| Error::GenericError(format!("placeholder encoding task panicked: {e}")))?
    .map_err(|e| Error::FilesystemError {
        op: format!("writing placeholder {kind}"),
        path: destination.to_path_buf(),
        source: std::io::Error::other(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthesizes_each_kind_with_required_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [
            AssetKind::IconIco,
            AssetKind::IconPng,
            AssetKind::WizardSidebar,
            AssetKind::WizardHeader,
        ] {
            let dest = dir.path().join("assets").join(kind.file_name());
            let prepared = ensure(kind, &dest, "prepare-assets").await.unwrap();
            assert!(prepared.synthesized);
            assert!(prepared.artifact.size > 0);
            assert_eq!(image::image_dimensions(&dest).unwrap(), kind.dimensions());
        }
    }

    #[tokio::test]
    async fn never_overwrites_user_asset() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("icon.png");
        std::fs::write(&dest, b"user supplied bytes").unwrap();

        let prepared = ensure(AssetKind::IconPng, &dest, "prepare-assets").await.unwrap();
        assert!(!prepared.synthesized);
        assert_eq!(std::fs::read(&dest).unwrap(), b"user supplied bytes");
    }

    #[tokio::test]
    async fn placeholders_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = ensure(AssetKind::WizardHeader, &dir.path().join("a.bmp"), "s")
            .await
            .unwrap();
        let b = ensure(AssetKind::WizardHeader, &dir.path().join("b.bmp"), "s")
            .await
            .unwrap();
        assert_eq!(a.artifact.checksum, b.artifact.checksum);
    }

    #[tokio::test]
    async fn directory_in_the_way_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("icon.ico");
        std::fs::create_dir(&dest).unwrap();
        let err = ensure(AssetKind::IconIco, &dest, "s").await.unwrap_err();
        assert!(matches!(err, Error::FilesystemError { .. }));
    }
}
