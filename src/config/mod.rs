//! Project configuration from `packaging.toml`.
//!
//! Every key is optional. The file is parsed once and folded into a
//! [`SettingsBuilder`]; validation happens when the builder runs.

use crate::{
    bundler::{Manifest, PackageSettings, SettingsBuilder, ToolRole, ToolsSettings},
    error::{PackagerError, Result},
};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Conventional configuration file name at the source root.
pub const CONFIG_FILE_NAME: &str = "packaging.toml";

/// Parsed `packaging.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// `[package]`
    pub package: PackageSettings,
    /// Files shipped next to the executable, relative to the source root.
    pub auxiliary_files: Option<Vec<PathBuf>>,
    /// Modules the packager must bundle explicitly.
    pub hidden_imports: Vec<String>,
    /// `[paths]`
    pub paths: PathsConfig,
    /// `[manifest]`, in document order.
    pub manifest: Option<Manifest>,
    /// `[tools.*]`
    pub tools: ToolsConfig,
}

/// `[paths]`: directories relative to the source root.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub assets: Option<PathBuf>,
    pub build: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// `[tools]`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub packager: Option<ToolConfig>,
    pub installer_compiler: Option<ToolConfig>,
    pub appimage_tool: Option<ToolConfig>,
}

/// Overrides for one tool; unset keys keep the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub program: Option<String>,
    pub timeout_secs: Option<u64>,
    pub install_hint: Option<String>,
    pub extra_args: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self> {
        toml::from_str(raw).map_err(|source| PackagerError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `explicit` if given, else `packaging.toml` under `source_root`
    /// if present, else built-in defaults.
    pub fn discover(source_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::debug!("Loading configuration from {}", path.display());
            return Self::load(path);
        }
        let conventional = source_root.join(CONFIG_FILE_NAME);
        if conventional.is_file() {
            log::debug!("Loading configuration from {}", conventional.display());
            Self::load(&conventional)
        } else {
            log::debug!("No {CONFIG_FILE_NAME} in {}, using defaults", source_root.display());
            Ok(Self::default())
        }
    }

    /// Folds this configuration into a builder rooted at `source_root`.
    pub fn into_builder(self, source_root: &Path) -> SettingsBuilder {
        let mut builder = SettingsBuilder::new()
            .source_root(source_root)
            .package_settings(self.package)
            .hidden_imports(self.hidden_imports)
            .tools(self.tools.merged());

        if let Some(files) = self.auxiliary_files {
            builder = builder.auxiliary_files(files);
        }
        if let Some(dir) = self.paths.assets {
            builder = builder.assets_dir(dir);
        }
        if let Some(dir) = self.paths.build {
            builder = builder.build_root(dir);
        }
        if let Some(dir) = self.paths.output {
            builder = builder.output_root(dir);
        }
        if let Some(manifest) = self.manifest {
            builder = builder.manifest(manifest);
        }
        builder
    }
}

impl ToolsConfig {
    /// Built-in tool defaults with these overrides applied.
    pub fn merged(self) -> ToolsSettings {
        let mut tools = ToolsSettings::default();
        for (role, config) in [
            (ToolRole::Packager, self.packager),
            (ToolRole::InstallerCompiler, self.installer_compiler),
            (ToolRole::AppImageTool, self.appimage_tool),
        ] {
            let Some(config) = config else { continue };
            let tool = tools.get_mut(role);
            if let Some(program) = config.program {
                tool.program = program;
            }
            if let Some(secs) = config.timeout_secs {
                tool.timeout = Duration::from_secs(secs);
            }
            if let Some(hint) = config.install_hint {
                tool.install_hint = hint;
            }
            if let Some(args) = config.extra_args {
                tool.extra_args = args;
            }
        }
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
auxiliary_files = ["README.md", "CHANGELOG.md"]
hidden_imports = ["PyQt5.QtWebEngineWidgets"]

[package]
name = "WebShell"
version = "2.1.0"
entry_point = "src/app.py"
publisher = "Shell Works"

[paths]
output = "release"

[manifest]
"icons/*.png" = "icons/"
"*.html" = "."

[tools.installer_compiler]
program = "/opt/nsis/makensis"
timeout_secs = 30
"#;

    #[test]
    fn full_file_maps_onto_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::parse(FULL, Path::new("packaging.toml")).unwrap();
        let settings = config.into_builder(dir.path()).build().unwrap();

        assert_eq!(settings.product_name(), "WebShell");
        assert_eq!(settings.version_string(), "2.1.0");
        assert_eq!(settings.entry_point(), dir.path().join("src/app.py"));
        assert_eq!(settings.output_root(), dir.path().join("release"));
        assert_eq!(settings.build_root(), dir.path().join("build"));
        assert_eq!(settings.hidden_imports(), ["PyQt5.QtWebEngineWidgets"]);
        assert_eq!(settings.auxiliary_files().len(), 2);

        let patterns: Vec<_> = settings
            .manifest()
            .entries()
            .iter()
            .map(|e| e.pattern.as_str())
            .collect();
        assert_eq!(patterns, ["icons/*.png", "*.html"]);

        let nsis = settings.tools().get(ToolRole::InstallerCompiler);
        assert_eq!(nsis.program, "/opt/nsis/makensis");
        assert_eq!(nsis.timeout, Duration::from_secs(30));
        assert_eq!(settings.tools().get(ToolRole::Packager).program, "pyinstaller");
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::discover(dir.path(), None).unwrap();
        assert!(config.manifest.is_none());
        let settings = config.into_builder(dir.path()).build().unwrap();
        assert_eq!(settings.manifest(), &Manifest::default_web_resources());
    }

    #[test]
    fn zero_tool_timeout_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw = "[tools.packager]\ntimeout_secs = 0\n";
        let config = ProjectConfig::parse(raw, Path::new("packaging.toml")).unwrap();
        let err = PackagerError::from(config.into_builder(dir.path()).build().unwrap_err());
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProjectConfig::parse("[package]\nnmae = \"x\"\n", Path::new("p.toml")).unwrap_err();
        assert!(matches!(err, PackagerError::Toml { .. }));
        assert_eq!(err.exit_code(), 9);
    }
}
