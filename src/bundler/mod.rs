//! Release packaging pipeline.
//!
//! Turns application sources and resource files into distributables:
//! a single-file executable, a portable folder plus zip, an installer and an
//! AppImage. Each is a [`BuildTarget`] run by the [`Pipeline`].
//!
//! # Module Organization
//!
//! - [`settings`] - validated, immutable run configuration
//! - [`target`] - built-in targets as stage lists
//! - [`assets`] - icon and installer image preparation
//! - [`staging`] - manifest-driven resource staging
//! - [`builder`] - orchestrator, tool invocation and verification
//! - [`assembler`] - portable folder, archive, installer payload, AppDir
//! - [`template`] - template variables for stage parameters
//! - [`error`] - error taxonomy

pub mod assembler;
pub mod assets;
pub mod builder;
pub mod error;
pub mod settings;
pub mod staging;
pub mod target;
pub mod template;
pub mod utils;

pub use assembler::AssemblyKind;
pub use assets::AssetKind;
pub use builder::{
    Artifact, BuildContext, BuildReport, ExternalToolSpec, FailureReport, Pipeline, PipelineState,
    ResolvedTool, RunStatus, StageOutcome, StageRecord, StageResult, StageStatus, ToolInvoker,
    ToolOutput,
};
pub use error::{Error, ErrorKind, Result};
pub use settings::{
    Manifest, ManifestEntry, PackageSettings, Settings, SettingsBuilder, ToolRole, ToolSettings,
    ToolsSettings,
};
pub use target::{BuildTarget, Stage, TargetKind};
