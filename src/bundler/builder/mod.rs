//! Pipeline engine.
//!
//! This module provides the [`Pipeline`] orchestrator that runs a
//! [`BuildTarget`](crate::bundler::BuildTarget) stage by stage and turns the
//! outcome into a [`BuildReport`].
//!
//! # Example
//!
//! ```no_run
//! use webshell_packager::bundler::{PackageSettings, Pipeline, SettingsBuilder, TargetKind};
//!
//! # async fn example() -> webshell_packager::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .source_root("webshell")
//!     .package_settings(PackageSettings {
//!         product_name: "WebShell".into(),
//!         version: "1.0.0".into(),
//!         ..Default::default()
//!     })
//!     .build()?;
//! let pipeline = Pipeline::new(settings);
//!
//! let report = pipeline.run(&pipeline.target(TargetKind::OneFile)).await;
//! for artifact in &report.artifacts {
//!     println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
//!     println!("SHA256: {}", artifact.checksum);
//! }
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`context`] - per-run [`BuildContext`] and [`Artifact`]
//! - [`invoker`] - bounded-time external tool execution
//! - [`orchestrator`] - [`Pipeline`] and its state machine
//! - [`report`] - [`BuildReport`]
//! - [`stage`] - execution of each stage variant
//! - [`tool_detection`] - per-run tool resolution
//! - [`verifier`] - the artifact verification gate

pub mod checksum;
pub mod context;
pub mod invoker;
pub mod orchestrator;
pub mod report;
pub mod stage;
pub mod tool_detection;
pub mod verifier;

pub use context::{Artifact, BuildContext};
pub use invoker::{ExternalToolSpec, ToolInvoker, ToolOutput};
pub use orchestrator::{Pipeline, PipelineState, ResolvedTool};
pub use report::{BuildReport, FailureReport, RunStatus, StageRecord, StageStatus};
pub use stage::{StageOutcome, StageResult};
pub use tool_detection::ToolResolver;
