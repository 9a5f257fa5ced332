//! Per-run state threaded through every stage.

use super::{
    checksum::{calculate_sha256, total_size},
    invoker::ToolInvoker,
};
use crate::bundler::{
    error::Result,
    settings::Settings,
    target::BuildTarget,
    template::TemplateVars,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A build output with its recorded size and checksum.
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Absolute path of the file (or directory, for assembled trees).
    pub path: PathBuf,
    /// Size in bytes; the sum of member sizes for directories.
    pub size: u64,
    /// Hex-encoded SHA-256.
    pub checksum: String,
    /// Name of the stage that produced it.
    pub stage: String,
}

impl Artifact {
    pub fn new(path: PathBuf, size: u64, checksum: String, stage: impl Into<String>) -> Self {
        Self {
            path,
            size,
            checksum,
            stage: stage.into(),
        }
    }

    /// Measures and hashes whatever is at `path`.
    pub async fn from_path(path: &Path, stage: impl Into<String>) -> Result<Self> {
        let size = total_size(path).await?;
        let checksum = calculate_sha256(path).await?;
        Ok(Self::new(path.to_path_buf(), size, checksum, stage))
    }
}

/// Mutable state of one pipeline run.
///
/// Owned by a single run; two targets never share a context.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub settings: &'a Settings,
    pub target: &'a BuildTarget,
    pub vars: TemplateVars,
    pub invoker: ToolInvoker,
    /// Verified and assembled outputs, in production order. Only grows.
    pub artifacts: Vec<Artifact>,
    /// Prepared assets and staged resources consumed by later stages.
    pub inputs: Vec<Artifact>,
    /// Most recently verified tool output, the input of assembly.
    pub primary: Option<Artifact>,
    /// Absorbed conditions worth surfacing in the report.
    pub warnings: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(settings: &'a Settings, target: &'a BuildTarget, invoker: ToolInvoker) -> Self {
        Self {
            settings,
            target,
            vars: target.template_vars(settings),
            invoker,
            artifacts: Vec::new(),
            inputs: Vec::new(),
            primary: None,
            warnings: Vec::new(),
        }
    }

    /// Renders a stage path template.
    pub fn render_path(&self, template: &str) -> Result<PathBuf> {
        self.vars.render(template).map(PathBuf::from)
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    /// Looks up an earlier output by path.
    pub fn produced(&self, path: &Path) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}
