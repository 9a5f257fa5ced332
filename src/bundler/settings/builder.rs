//! Builder for constructing Settings.

use super::{Manifest, PackageSettings, Settings, ToolsSettings};
use crate::bundler::error::{Context, Error, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

/// Builder for constructing [`Settings`].
///
/// Relative directories are resolved against the source root; the source root
/// itself is resolved against the current directory.
///
/// # Examples
///
/// ```no_run
/// use webshell_packager::bundler::{Manifest, PackageSettings, SettingsBuilder};
///
/// # fn example() -> webshell_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source_root("app")
///     .package_settings(PackageSettings {
///         product_name: "WebShell".into(),
///         ..Default::default()
///     })
///     .manifest(Manifest::new([("*.html", ".")]))
///     .output_root("release")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    source_root: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    assets_dir: Option<PathBuf>,
    build_root: Option<PathBuf>,
    output_root: Option<PathBuf>,
    manifest: Option<Manifest>,
    auxiliary_files: Option<Vec<PathBuf>>,
    hidden_imports: Vec<String>,
    tools: ToolsSettings,
    timeout_override: Option<Duration>,
    tool_search_path: Option<OsString>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the source tree root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn source_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets application metadata. An empty product name falls back to the
    /// source directory name.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Default: `<source>/assets`
    pub fn assets_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.assets_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<source>/build`
    pub fn build_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<source>/dist`
    pub fn output_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: [`Manifest::default_web_resources`]
    pub fn manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Default: `README.md`, `LICENSE`
    pub fn auxiliary_files(mut self, files: Vec<PathBuf>) -> Self {
        self.auxiliary_files = Some(files);
        self
    }

    pub fn hidden_imports(mut self, imports: Vec<String>) -> Self {
        self.hidden_imports = imports;
        self
    }

    /// Default: [`ToolsSettings::default`]
    pub fn tools(mut self, tools: ToolsSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Applies one timeout to every tool, after [`SettingsBuilder::tools`].
    pub fn timeout_override(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Searches only these directories for tools instead of `PATH`.
    pub fn tool_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.tool_search_path = Some(path.into());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing, the source root does not
    /// exist, or the manifest is invalid.
    pub fn build(self) -> Result<Settings> {
        let source_root = self.source_root.context("source_root is required")?;
        let source_root = source_root
            .absolutize()
            .fs_context("resolving source root", &source_root)?
            .into_owned();
        if !source_root.is_dir() {
            return Err(Error::Config(format!(
                "source root {} is not a directory",
                source_root.display()
            )));
        }

        let mut package = self.package_settings.context("package_settings is required")?;
        if package.product_name.trim().is_empty() {
            package.product_name = source_root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("app")
                .to_string();
        }
        if package.product_name.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "product name `{}` cannot contain path separators",
                package.product_name
            )));
        }

        let resolve = |dir: Option<PathBuf>, default: &str| -> Result<PathBuf> {
            let dir = dir.unwrap_or_else(|| PathBuf::from(default));
            Ok(dir
                .absolutize_from(&source_root)
                .fs_context("resolving directory", &dir)?
                .into_owned())
        };
        let assets_dir = resolve(self.assets_dir, "assets")?;
        let build_root = resolve(self.build_root, "build")?;
        let output_root = resolve(self.output_root, "dist")?;
        for (key, root) in [("build", &build_root), ("output", &output_root)] {
            if source_root.starts_with(root) {
                return Err(Error::Config(format!(
                    "{key} root {} must not be, or contain, the source root",
                    root.display()
                )));
            }
        }

        let manifest = self
            .manifest
            .unwrap_or_else(Manifest::default_web_resources);
        manifest.validate()?;

        let auxiliary_files = self
            .auxiliary_files
            .unwrap_or_else(|| vec![PathBuf::from("README.md"), PathBuf::from("LICENSE")]);

        let mut tools = self.tools;
        if let Some(timeout) = self.timeout_override {
            tools.override_timeout(timeout);
        }
        for tool in [&tools.packager, &tools.installer_compiler, &tools.appimage_tool] {
            if tool.timeout.is_zero() {
                return Err(Error::Config(format!(
                    "timeout for `{}` must be at least one second",
                    tool.program
                )));
            }
        }

        Ok(Settings::new(
            package,
            source_root,
            assets_dir,
            build_root,
            output_root,
            manifest,
            auxiliary_files,
            self.hidden_imports,
            tools,
            self.tool_search_path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_under_source_root() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings::default())
            .build()
            .unwrap();

        assert_eq!(settings.build_root(), dir.path().join("build"));
        assert_eq!(settings.output_root(), dir.path().join("dist"));
        assert_eq!(settings.assets_dir(), dir.path().join("assets"));
        assert_eq!(settings.version_string(), "0.1.0");
        // empty name falls back to the directory name
        assert_eq!(
            settings.product_name(),
            dir.path().file_name().unwrap().to_str().unwrap()
        );
    }

    #[test]
    fn timeout_override_applies_to_all_tools() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings::default())
            .timeout_override(Duration::from_secs(7))
            .build()
            .unwrap();
        let tools = settings.tools();
        assert_eq!(tools.packager.timeout, Duration::from_secs(7));
        assert_eq!(tools.installer_compiler.timeout, Duration::from_secs(7));
        assert_eq!(tools.appimage_tool.timeout, Duration::from_secs(7));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings::default())
            .timeout_override(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("pyinstaller"));
    }

    #[test]
    fn output_root_cannot_contain_the_sources() {
        let dir = tempfile::tempdir().unwrap();
        let err = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings::default())
            .output_root(".")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_source_root_is_an_error() {
        let err = SettingsBuilder::new()
            .package_settings(PackageSettings::default())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("source_root"));
    }
}
