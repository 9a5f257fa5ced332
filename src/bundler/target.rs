//! Build target definitions.
//!
//! A target is data: an ordered list of [`Stage`]s whose paths and tool
//! arguments are templates over [`TemplateVars`]. Adding a target means adding
//! a stage list here, not another hand-written build script.

use crate::bundler::{
    assembler::AssemblyKind,
    assets::AssetKind,
    settings::{Settings, ToolRole},
    template::{ListVar, TemplateVars},
};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Independently runnable packaging procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Single-file executable.
    OneFile,
    /// Flat directory plus zip archive.
    Portable,
    /// Setup executable built by the installer compiler.
    Installer,
    /// Linux AppImage.
    AppImage,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::OneFile,
        TargetKind::Portable,
        TargetKind::Installer,
        TargetKind::AppImage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::OneFile => "onefile",
            TargetKind::Portable => "portable",
            TargetKind::Installer => "installer",
            TargetKind::AppImage => "appimage",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown target `{s}`. Valid targets: {}",
                    TargetKind::ALL.map(|k| k.as_str()).join(", ")
                )
            })
    }
}

/// One tool argument: a template, or a template group repeated per list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgTemplate {
    One(String),
    Each { list: ListVar, args: Vec<String> },
}

impl ArgTemplate {
    fn one(s: &str) -> Self {
        ArgTemplate::One(s.to_string())
    }

    fn each(list: ListVar, args: &[&str]) -> Self {
        ArgTemplate::Each {
            list,
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One step of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Ensure icons/wizard images exist, synthesizing placeholders.
    PrepareAssets { assets: Vec<AssetKind> },
    /// Copy manifest matches into the staging root.
    StageResources,
    /// Run an external tool.
    Invoke {
        tool: ToolRole,
        args: Vec<ArgTemplate>,
        working_dir: String,
        env: Vec<(String, String)>,
    },
    /// Gate: the file must exist and be non-empty.
    Verify { expected: String },
    /// Build a derived distributable from verified artifacts.
    Assemble { kind: AssemblyKind, destination: String },
}

impl Stage {
    /// Name used in logs and failure reports.
    pub fn name(&self) -> String {
        match self {
            Stage::PrepareAssets { .. } => "prepare-assets".to_string(),
            Stage::StageResources => "stage-resources".to_string(),
            Stage::Invoke { tool, .. } => format!("invoke:{tool}"),
            Stage::Verify { .. } => "verify".to_string(),
            Stage::Assemble { kind, .. } => format!("assemble:{kind}"),
        }
    }
}

/// A named packaging procedure with its owned directories.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    kind: TargetKind,
    stages: Vec<Stage>,
    required_tools: Vec<ToolRole>,
    build_dir: PathBuf,
    output_dir: PathBuf,
}

impl BuildTarget {
    /// Built-in definition of `kind`.
    ///
    /// The target owns `<build>/<kind>` and `<output>/<kind>` (or `output_override`).
    pub fn new(kind: TargetKind, settings: &Settings, output_override: Option<&Path>) -> Self {
        let build_dir = settings.build_root().join(kind.as_str());
        let output_dir = output_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| settings.output_root().join(kind.as_str()));

        let stages = match kind {
            TargetKind::OneFile => vec![
                Stage::PrepareAssets {
                    assets: vec![AssetKind::IconIco],
                },
                Stage::StageResources,
                packager("{{output_dir}}", "{{icon_ico}}"),
                verify("{{output_dir}}/{{exe_name}}"),
            ],
            TargetKind::Portable => vec![
                Stage::PrepareAssets {
                    assets: vec![AssetKind::IconIco],
                },
                Stage::StageResources,
                packager("{{dist_dir}}", "{{icon_ico}}"),
                verify("{{dist_dir}}/{{exe_name}}"),
                Stage::Assemble {
                    kind: AssemblyKind::Portable,
                    destination: "{{output_dir}}/{{name}}-portable".to_string(),
                },
                Stage::Assemble {
                    kind: AssemblyKind::Archive {
                        source: "{{output_dir}}/{{name}}-portable".to_string(),
                    },
                    destination: "{{output_dir}}/{{name}}-{{version}}-portable.zip".to_string(),
                },
            ],
            TargetKind::Installer => vec![
                Stage::PrepareAssets {
                    assets: vec![
                        AssetKind::IconIco,
                        AssetKind::WizardSidebar,
                        AssetKind::WizardHeader,
                    ],
                },
                Stage::StageResources,
                packager("{{dist_dir}}", "{{icon_ico}}"),
                verify("{{dist_dir}}/{{exe_name}}"),
                Stage::Assemble {
                    kind: AssemblyKind::InstallerPayload,
                    destination: "{{installer_dir}}".to_string(),
                },
                Stage::Invoke {
                    tool: ToolRole::InstallerCompiler,
                    args: vec![
                        ArgTemplate::one("-V3"),
                        ArgTemplate::one("-INPUTCHARSET"),
                        ArgTemplate::one("UTF8"),
                        ArgTemplate::one("-OUTPUTCHARSET"),
                        ArgTemplate::one("UTF8"),
                        ArgTemplate::one("-DOUTPUT_FILE={{output_dir}}/{{name}}-{{version}}-setup.exe"),
                        ArgTemplate::one("{{installer_script}}"),
                    ],
                    working_dir: "{{installer_dir}}".to_string(),
                    env: Vec::new(),
                },
                verify("{{output_dir}}/{{name}}-{{version}}-setup.exe"),
            ],
            TargetKind::AppImage => vec![
                Stage::PrepareAssets {
                    assets: vec![AssetKind::IconPng],
                },
                Stage::StageResources,
                packager("{{dist_dir}}", "{{icon_png}}"),
                verify("{{dist_dir}}/{{exe_name}}"),
                Stage::Assemble {
                    kind: AssemblyKind::AppDir,
                    destination: "{{appdir}}".to_string(),
                },
                Stage::Invoke {
                    tool: ToolRole::AppImageTool,
                    args: vec![
                        ArgTemplate::one("--no-appstream"),
                        ArgTemplate::one("{{appdir}}"),
                        ArgTemplate::one("{{output_dir}}/{{name}}-{{arch}}.AppImage"),
                    ],
                    working_dir: "{{build_dir}}".to_string(),
                    env: vec![("ARCH".to_string(), "{{arch}}".to_string())],
                },
                verify("{{output_dir}}/{{name}}-{{arch}}.AppImage"),
            ],
        };

        let mut required_tools: Vec<ToolRole> = stages
            .iter()
            .filter_map(|s| match s {
                Stage::Invoke { tool, .. } => Some(*tool),
                _ => None,
            })
            .collect();
        required_tools.sort();
        required_tools.dedup();

        Self {
            kind,
            stages,
            required_tools,
            build_dir,
            output_dir,
        }
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Tools that must resolve before anything on disk is touched.
    pub fn required_tools(&self) -> &[ToolRole] {
        &self.required_tools
    }

    /// Pipeline-owned scratch directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Pipeline-owned output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Staging root inside the build directory.
    pub fn staging_root(&self) -> PathBuf {
        self.build_dir.join("staging")
    }

    /// Directories removed by the clean step.
    pub fn owned_dirs(&self) -> [&Path; 2] {
        [&self.build_dir, &self.output_dir]
    }

    /// Variables every stage template of this target may reference.
    pub fn template_vars(&self, settings: &Settings) -> TemplateVars {
        let s = |p: &Path| p.display().to_string();
        let staging_root = self.staging_root();
        let assets = settings.assets_dir();
        let installer_dir = self.build_dir.join("installer");
        let data_sep = if cfg!(windows) { ";" } else { ":" };

        let mut vars = TemplateVars::new();
        vars.set("target", self.kind.as_str())
            .set("name", settings.product_name())
            .set("version", settings.version_string())
            .set("description", settings.description())
            .set("exe_name", settings.exe_name())
            .set("entry_point", s(&settings.entry_point()))
            .set("source_root", s(settings.source_root()))
            .set("staging_root", s(&staging_root))
            .set("build_dir", s(&self.build_dir))
            .set("work_dir", s(&self.build_dir.join("work")))
            .set("dist_dir", s(&self.build_dir.join("dist")))
            .set("output_dir", s(&self.output_dir))
            .set("assets_dir", s(assets))
            .set("icon_ico", s(&assets.join(AssetKind::IconIco.file_name())))
            .set("icon_png", s(&assets.join(AssetKind::IconPng.file_name())))
            .set("wizard_sidebar", s(&assets.join(AssetKind::WizardSidebar.file_name())))
            .set("wizard_header", s(&assets.join(AssetKind::WizardHeader.file_name())))
            .set("installer_script", s(&installer_dir.join("installer.nsi")))
            .set("installer_dir", s(&installer_dir))
            .set(
                "appdir",
                s(&self.build_dir.join(format!("{}.AppDir", settings.product_name()))),
            )
            .set("arch", std::env::consts::ARCH)
            .set("data_sep", data_sep);

        let mut data_rules: Vec<String> = Vec::new();
        for entry in settings.manifest().entries() {
            let dest = normalize_destination(&entry.destination);
            let src = if dest == "." {
                staging_root.clone()
            } else {
                staging_root.join(&dest)
            };
            let rule = format!("{}{data_sep}{dest}", s(&src));
            if !data_rules.contains(&rule) {
                data_rules.push(rule);
            }
        }
        vars.set_list(ListVar::DataRules, data_rules);
        vars.set_list(ListVar::HiddenImports, settings.hidden_imports().to_vec());
        vars
    }
}

/// `"icons/"` -> `"icons"`, `""` -> `"."`.
pub(crate) fn normalize_destination(dest: &str) -> String {
    let trimmed = dest.trim().trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

fn packager(distpath: &str, icon: &str) -> Stage {
    Stage::Invoke {
        tool: ToolRole::Packager,
        args: vec![
            ArgTemplate::one("{{entry_point}}"),
            ArgTemplate::one("--noconfirm"),
            ArgTemplate::one("--clean"),
            ArgTemplate::one("--onefile"),
            ArgTemplate::one("--windowed"),
            ArgTemplate::one("--name"),
            ArgTemplate::one("{{name}}"),
            ArgTemplate::one("--distpath"),
            ArgTemplate::One(distpath.to_string()),
            ArgTemplate::one("--workpath"),
            ArgTemplate::one("{{work_dir}}"),
            ArgTemplate::one("--specpath"),
            ArgTemplate::one("{{build_dir}}"),
            ArgTemplate::one("--icon"),
            ArgTemplate::One(icon.to_string()),
            ArgTemplate::each(ListVar::DataRules, &["--add-data", "{{item}}"]),
            ArgTemplate::each(ListVar::HiddenImports, &["--hidden-import", "{{item}}"]),
        ],
        working_dir: "{{source_root}}".to_string(),
        env: Vec::new(),
    }
}

fn verify(expected: &str) -> Stage {
    Stage::Verify {
        expected: expected.to_string(),
    }
}
