//! Core Settings struct and implementations.

use super::{Manifest, PackageSettings, ToolsSettings};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// Main settings for a packaging run.
///
/// Immutable once built; constructed via [`SettingsBuilder`](super::SettingsBuilder)
/// and shared read-only by every target.
///
/// # Examples
///
/// ```no_run
/// use webshell_packager::bundler::{PackageSettings, SettingsBuilder};
///
/// # fn example() -> webshell_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source_root(".")
///     .package_settings(PackageSettings {
///         product_name: "WebShell".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .build()?;
/// assert_eq!(settings.product_name(), "WebShell");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    package: PackageSettings,
    source_root: PathBuf,
    assets_dir: PathBuf,
    build_root: PathBuf,
    output_root: PathBuf,
    manifest: Manifest,
    auxiliary_files: Vec<PathBuf>,
    hidden_imports: Vec<String>,
    tools: ToolsSettings,
    /// Explicit tool search path; `None` means the process `PATH`.
    tool_search_path: Option<OsString>,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the application description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// Returns the package metadata.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// File name of the packaged executable on this platform.
    pub fn exe_name(&self) -> String {
        format!("{}{}", self.package.product_name, std::env::consts::EXE_SUFFIX)
    }

    /// Absolute source tree root. Never cleaned.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Absolute path of the application entry point.
    pub fn entry_point(&self) -> PathBuf {
        self.source_root.join(&self.package.entry_point)
    }

    /// Directory holding icons and installer images.
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Parent of every per-target build directory.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Parent of every per-target output directory.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Auxiliary files shipped next to the executable, relative to the source root.
    pub fn auxiliary_files(&self) -> &[PathBuf] {
        &self.auxiliary_files
    }

    /// Hidden imports passed to the packager.
    pub fn hidden_imports(&self) -> &[String] {
        &self.hidden_imports
    }

    pub fn tools(&self) -> &ToolsSettings {
        &self.tools
    }

    pub fn tool_search_path(&self) -> Option<&OsStr> {
        self.tool_search_path.as_deref()
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        package: PackageSettings,
        source_root: PathBuf,
        assets_dir: PathBuf,
        build_root: PathBuf,
        output_root: PathBuf,
        manifest: Manifest,
        auxiliary_files: Vec<PathBuf>,
        hidden_imports: Vec<String>,
        tools: ToolsSettings,
        tool_search_path: Option<OsString>,
    ) -> Self {
        Self {
            package,
            source_root,
            assets_dir,
            build_root,
            output_root,
            manifest,
            auxiliary_files,
            hidden_imports,
            tools,
            tool_search_path,
        }
    }
}
