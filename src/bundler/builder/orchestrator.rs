//! Pipeline orchestration.
//!
//! The [`Pipeline`] runs one [`BuildTarget`] at a time: pre-flight, clean,
//! then every stage in order. It is the only place that decides to halt a run.

use super::{
    Artifact, BuildContext,
    invoker::ToolInvoker,
    report::{BuildReport, FailureReport, RunStatus, StageRecord, StageStatus},
    stage::StageOutcome,
    tool_detection::ToolResolver,
};
use crate::bundler::{
    error::{Error, Result},
    settings::{Settings, ToolRole},
    target::{BuildTarget, TargetKind},
    utils::fs,
};
use chrono::Utc;
use serde::Serialize;
use std::{path::PathBuf, time::Instant};
use uuid::Uuid;

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Preparing,
    Staging,
    Invoking,
    Verifying,
    Assembling,
    Succeeded,
    Failed,
}

/// A tool found during pre-flight.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTool {
    pub role: ToolRole,
    pub program: String,
    pub path: PathBuf,
}

/// Runs build targets against one immutable [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use webshell_packager::bundler::{PackageSettings, Pipeline, SettingsBuilder, TargetKind};
///
/// # async fn example() -> webshell_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source_root(".")
///     .package_settings(PackageSettings::default())
///     .build()?;
/// let pipeline = Pipeline::new(settings);
/// let target = pipeline.target(TargetKind::Portable);
/// let report = pipeline.run(&target).await;
/// println!("{}", report.summary_line());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    output_override: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            output_override: None,
        }
    }

    /// Replaces the per-target output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_override = Some(dir.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Built-in definition of `kind` with this pipeline's overrides.
    pub fn target(&self, kind: TargetKind) -> BuildTarget {
        BuildTarget::new(kind, &self.settings, self.output_override.as_deref())
    }

    fn invoker(&self) -> ToolInvoker {
        ToolInvoker::new(ToolResolver::new(
            self.settings.tool_search_path(),
            self.settings.source_root(),
        ))
    }

    /// Resolves every required tool without touching the filesystem.
    ///
    /// # Errors
    ///
    /// [`Error::MissingDependency`] for the first tool that cannot be found,
    /// [`Error::Config`] when the entry point does not exist.
    pub fn check(&self, target: &BuildTarget) -> Result<Vec<ResolvedTool>> {
        let mut invoker = self.invoker();
        self.preflight(target, &mut invoker)
    }

    fn preflight(&self, target: &BuildTarget, invoker: &mut ToolInvoker) -> Result<Vec<ResolvedTool>> {
        self.guard_owned_dirs(target)?;
        let mut resolved = Vec::new();
        for role in target.required_tools() {
            let tool = self.settings.tools().get(*role);
            let path = invoker.resolve(tool)?;
            resolved.push(ResolvedTool {
                role: *role,
                program: tool.program.clone(),
                path,
            });
        }

        let entry = self.settings.entry_point();
        if !entry.is_file() {
            return Err(Error::Config(format!(
                "entry point {} does not exist",
                entry.display()
            )));
        }
        Ok(resolved)
    }

    /// Owned directories may never hold sources: each one must lie outside
    /// the source tree, or under the configured build or output root.
    fn guard_owned_dirs(&self, target: &BuildTarget) -> Result<()> {
        let source_root = self.settings.source_root();
        for dir in target.owned_dirs() {
            if source_root.starts_with(dir) {
                return Err(Error::Config(format!(
                    "refusing to clean {}: it contains the source tree {}",
                    dir.display(),
                    source_root.display()
                )));
            }
            let pipeline_owned = dir.starts_with(self.settings.build_root())
                || dir.starts_with(self.settings.output_root());
            if dir.starts_with(source_root) && !pipeline_owned {
                return Err(Error::Config(format!(
                    "refusing to clean {}: it lies inside the source tree {} \
                     and outside the build and output roots",
                    dir.display(),
                    source_root.display()
                )));
            }
        }
        Ok(())
    }

    /// Removes the target's build and output directories.
    ///
    /// Best effort: anything that cannot be removed (for example a file held
    /// open by a running process) is returned as a warning.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if an owned directory contains the source root, or
    /// lies inside it without being under the build or output root.
    pub async fn clean(&self, target: &BuildTarget) -> Result<Vec<String>> {
        self.guard_owned_dirs(target)?;

        let mut warnings = Vec::new();
        for dir in target.owned_dirs() {
            log::info!("Cleaning {}", dir.display());
            for (path, e) in fs::remove_dir_best_effort(dir).await {
                let message = format!("could not remove {}: {e}", path.display());
                log::warn!("{message}");
                warnings.push(message);
            }
        }
        Ok(warnings)
    }

    /// Runs `target` to completion and reports the outcome. Never panics on a
    /// stage failure and never returns an error: failures live in the report.
    pub async fn run(&self, target: &BuildTarget) -> BuildReport {
        let mut run = RunLog::new(target.kind());
        log::info!("Starting {} build (run {})", target.kind(), run.run_id);

        let mut invoker = self.invoker();
        let started = Instant::now();
        if let Err(e) = self.preflight(target, &mut invoker) {
            run.record("preflight", StageStatus::Failed, e.to_string(), started);
            return run.fail("preflight", &e, Vec::new(), Vec::new());
        }
        run.record("preflight", StageStatus::Success, "tools resolved", started);

        let started = Instant::now();
        match self.prepare_directories(target).await {
            Ok(warnings) if warnings.is_empty() => {
                run.record("clean", StageStatus::Success, "removed previous output", started);
            }
            Ok(warnings) => {
                let message = format!("{} path(s) could not be removed", warnings.len());
                run.record("clean", StageStatus::Skipped, message, started);
                run.warnings.extend(warnings);
            }
            Err(e) => {
                run.record("clean", StageStatus::Failed, e.to_string(), started);
                return run.fail("clean", &e, Vec::new(), Vec::new());
            }
        }

        let mut ctx = BuildContext::new(&self.settings, target, invoker);
        let stages = target.stages();
        for (index, stage) in stages.iter().enumerate() {
            let name = stage.name();
            run.enter(stage.state());
            log::info!("[{}/{}] {name}", index + 1, stages.len());

            let started = Instant::now();
            let result = stage.run(&mut ctx).await;
            if let Some(artifact) = result.artifact {
                ctx.artifacts.push(artifact);
            }
            match result.outcome {
                StageOutcome::Success => {
                    run.record(&name, StageStatus::Success, result.message, started);
                }
                StageOutcome::Skipped => {
                    run.record(&name, StageStatus::Skipped, result.message, started);
                }
                StageOutcome::Failed(e) => {
                    log::error!("{name} failed: {e}");
                    run.record(&name, StageStatus::Failed, result.message, started);
                    for rest in &stages[index + 1..] {
                        run.records.push(StageRecord {
                            name: rest.name(),
                            status: StageStatus::Skipped,
                            message: "not run after earlier failure".to_string(),
                            duration_ms: 0,
                        });
                    }
                    run.warnings.append(&mut ctx.warnings);
                    return run.fail(&name, &e, ctx.artifacts, ctx.inputs);
                }
            }
        }

        run.warnings.append(&mut ctx.warnings);
        run.succeed(ctx.artifacts, ctx.inputs)
    }

    async fn prepare_directories(&self, target: &BuildTarget) -> Result<Vec<String>> {
        let warnings = self.clean(target).await?;
        for dir in target.owned_dirs() {
            fs::create_dir_all(dir).await?;
        }
        Ok(warnings)
    }
}

/// Bookkeeping shared by every exit path of [`Pipeline::run`].
struct RunLog {
    run_id: Uuid,
    target: TargetKind,
    started_at: chrono::DateTime<Utc>,
    states: Vec<PipelineState>,
    records: Vec<StageRecord>,
    warnings: Vec<String>,
}

impl RunLog {
    fn new(target: TargetKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target,
            started_at: Utc::now(),
            states: vec![PipelineState::Idle],
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        if self.states.last() != Some(&state) {
            log::debug!("{} -> {state:?}", self.target);
            self.states.push(state);
        }
    }

    fn record(&mut self, name: &str, status: StageStatus, message: impl Into<String>, started: Instant) {
        self.records.push(StageRecord {
            name: name.to_string(),
            status,
            message: message.into(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
    }

    fn fail(
        mut self,
        stage: &str,
        error: &Error,
        verified: Vec<Artifact>,
        inputs: Vec<Artifact>,
    ) -> BuildReport {
        self.enter(PipelineState::Failed);
        if !verified.is_empty() {
            log::warn!(
                "{} artifact(s) passed verification before the failure; they are not ready for distribution",
                verified.len()
            );
        }
        self.finish(
            RunStatus::Failed,
            Some(FailureReport::new(stage, error)),
            Vec::new(),
            verified,
            inputs,
        )
    }

    fn succeed(
        mut self,
        artifacts: Vec<Artifact>,
        inputs: Vec<Artifact>,
    ) -> BuildReport {
        self.enter(PipelineState::Succeeded);
        for artifact in &artifacts {
            log::info!("Produced {} ({} bytes)", artifact.path.display(), artifact.size);
        }
        self.finish(RunStatus::Succeeded, None, artifacts, Vec::new(), inputs)
    }

    fn finish(
        self,
        status: RunStatus,
        failure: Option<FailureReport>,
        artifacts: Vec<Artifact>,
        verified_before_failure: Vec<Artifact>,
        inputs: Vec<Artifact>,
    ) -> BuildReport {
        BuildReport {
            run_id: self.run_id,
            target: self.target,
            status,
            started_at: self.started_at,
            finished_at: Utc::now(),
            failure,
            artifacts,
            verified_before_failure,
            inputs,
            warnings: self.warnings,
            stages: self.records,
            states: self.states,
        }
    }
}

