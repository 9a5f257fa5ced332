//! External tool settings.

use std::{fmt, time::Duration};

/// The external tools a target may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolRole {
    /// Turns the application entry point into a single executable.
    Packager,
    /// Compiles the installer script into a setup executable.
    InstallerCompiler,
    /// Turns an AppDir into a self-contained AppImage.
    AppImageTool,
}

impl ToolRole {
    /// Stable identifier used in stage names and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolRole::Packager => "packager",
            ToolRole::InstallerCompiler => "installer-compiler",
            ToolRole::AppImageTool => "appimage-tool",
        }
    }
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to find and run one external tool.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Program name looked up on the search path, or an explicit path.
    pub program: String,
    /// Time budget for a single invocation.
    pub timeout: Duration,
    /// Install suggestion shown when the program cannot be found.
    pub install_hint: String,
    /// Arguments passed ahead of the target's own arguments.
    pub extra_args: Vec<String>,
}

/// Settings for every [`ToolRole`].
#[derive(Debug, Clone)]
pub struct ToolsSettings {
    pub packager: ToolSettings,
    pub installer_compiler: ToolSettings,
    pub appimage_tool: ToolSettings,
}

impl ToolsSettings {
    /// Settings for `role`.
    pub fn get(&self, role: ToolRole) -> &ToolSettings {
        match role {
            ToolRole::Packager => &self.packager,
            ToolRole::InstallerCompiler => &self.installer_compiler,
            ToolRole::AppImageTool => &self.appimage_tool,
        }
    }

    /// Mutable settings for `role`.
    pub fn get_mut(&mut self, role: ToolRole) -> &mut ToolSettings {
        match role {
            ToolRole::Packager => &mut self.packager,
            ToolRole::InstallerCompiler => &mut self.installer_compiler,
            ToolRole::AppImageTool => &mut self.appimage_tool,
        }
    }

    /// Applies one timeout to every tool.
    pub fn override_timeout(&mut self, timeout: Duration) {
        self.packager.timeout = timeout;
        self.installer_compiler.timeout = timeout;
        self.appimage_tool.timeout = timeout;
    }
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            packager: ToolSettings {
                program: "pyinstaller".to_string(),
                timeout: Duration::from_secs(900),
                install_hint: "Install it with `pip install pyinstaller`.".to_string(),
                extra_args: Vec::new(),
            },
            installer_compiler: ToolSettings {
                program: "makensis".to_string(),
                timeout: Duration::from_secs(600),
                install_hint: "Install NSIS (e.g. `apt-get install nsis`, or https://nsis.sourceforge.io/Download)."
                    .to_string(),
                extra_args: Vec::new(),
            },
            appimage_tool: ToolSettings {
                program: "appimagetool".to_string(),
                timeout: Duration::from_secs(600),
                install_hint:
                    "Download it from https://github.com/AppImage/appimagetool/releases and put it on PATH."
                        .to_string(),
                extra_args: Vec::new(),
            },
        }
    }
}
