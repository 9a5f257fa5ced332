//! Derived distributables built from a verified primary artifact.
//!
//! # Module Organization
//!
//! - `portable` - flat directory with launcher and usage note
//! - `archive` - deterministic zip of an assembled directory
//! - `installer` - installer payload layout and compiler script
//! - `appdir` - AppDir tree consumed by the AppImage tool

mod appdir;
mod archive;
mod installer;
mod portable;

pub use archive::create_archive;
pub use installer::format_version_for_nsis;

use crate::bundler::{
    builder::Artifact,
    error::{Error, Result},
    settings::Settings,
    template::TemplateVars,
    utils::fs,
};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Assembly variants a target can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyKind {
    /// Executable, auxiliary files, launch script and usage note in one folder.
    Portable,
    /// Zip of a directory produced earlier in the same run (a template).
    Archive { source: String },
    /// Payload directory plus installer script for the installer compiler.
    InstallerPayload,
    /// AppDir layout for the AppImage tool.
    AppDir,
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssemblyKind::Portable => "portable",
            AssemblyKind::Archive { .. } => "archive",
            AssemblyKind::InstallerPayload => "installer-payload",
            AssemblyKind::AppDir => "appdir",
        })
    }
}

/// Read-only run data an assembler may need.
pub struct AssemblyContext<'a> {
    pub settings: &'a Settings,
    pub vars: &'a TemplateVars,
    /// Name of the calling stage, recorded on the artifact.
    pub stage: &'a str,
}

/// Builds `kind` at `destination` from `primary` and `extra_files`.
///
/// The destination is rebuilt from scratch. On failure whatever was written
/// is removed again; artifacts from earlier stages are never touched.
///
/// # Errors
///
/// Every failure is reported as [`Error::AssemblyFailed`].
pub async fn assemble(
    kind: &AssemblyKind,
    primary: &Artifact,
    extra_files: &[PathBuf],
    destination: &Path,
    cx: &AssemblyContext<'_>,
) -> Result<Artifact> {
    log::info!("Assembling {kind} at {}", destination.display());

    let built: Result<Artifact> = async {
        fs::remove_path(destination).await?;
        match kind {
            AssemblyKind::Portable => {
                portable::assemble(primary, extra_files, destination, cx).await?
            }
            AssemblyKind::Archive { source } => {
                let source = PathBuf::from(cx.vars.render(source)?);
                create_archive(&source, destination).await?;
            }
            AssemblyKind::InstallerPayload => {
                installer::assemble(primary, extra_files, destination, cx).await?
            }
            AssemblyKind::AppDir => appdir::assemble(primary, extra_files, destination, cx).await?,
        }
        Artifact::from_path(destination, cx.stage).await
    }
    .await;

    match built {
        Ok(artifact) => Ok(artifact),
        Err(e) => {
            if let Err(cleanup) = fs::remove_path(destination).await {
                log::warn!("Could not remove partial {kind} output: {cleanup}");
            }
            Err(match e {
                Error::AssemblyFailed { .. } => e,
                other => Error::AssemblyFailed {
                    reason: format!("{kind}: {other}"),
                },
            })
        }
    }
}

/// File name of `path`, or an assembly error naming what was expected.
fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| Error::AssemblyFailed {
        reason: format!("{} has no file name", path.display()),
    })
}
