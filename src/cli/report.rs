//! Human and JSON rendering of pipeline results.

use super::OutputManager;
use crate::{
    bundler::{Artifact, BuildReport, ResolvedTool, StageStatus, TargetKind},
    error::Result,
};
use serde::Serialize;

/// Prints a finished run.
pub fn print_build(output: &OutputManager, report: &BuildReport) {
    if report.is_success() {
        output.success(&report.summary_line());
        for artifact in &report.artifacts {
            output.indent(&describe(artifact));
        }
    } else {
        print_failure(output, report);
    }

    for warning in &report.warnings {
        output.warn(warning);
    }

    for stage in &report.stages {
        let status = match stage.status {
            StageStatus::Success => "ok",
            StageStatus::Failed => "FAILED",
            StageStatus::Skipped => "skipped",
        };
        output.verbose(&format!(
            "{:<28} {:<8} {:>6}ms  {}",
            stage.name, status, stage.duration_ms, stage.message
        ));
    }
}

/// Summary line, captured tool output and unfinished artifacts of a failed
/// run, all on stderr. Shown in every output mode.
pub fn print_failure(output: &OutputManager, report: &BuildReport) {
    output.error(&report.summary_line());
    if let Some(diagnostics) = report.failure.as_ref().and_then(|f| f.diagnostics.as_deref()) {
        for line in diagnostics.lines() {
            output.error_detail(line);
        }
    }
    if !report.verified_before_failure.is_empty() {
        output.warn("verified before the failure, not ready for distribution:");
        for artifact in &report.verified_before_failure {
            output.error_detail(&describe(artifact));
        }
    }
}

fn describe(artifact: &Artifact) -> String {
    format!(
        "{} ({} bytes, sha256 {})",
        artifact.path.display(),
        artifact.size,
        artifact.checksum
    )
}

/// Outcome of `check` for one target.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub target: TargetKind,
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ResolvedTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub fn print_check(output: &OutputManager, check: &CheckReport) {
    if check.ok {
        output.success(&format!("{}: all tools found", check.target));
        for tool in &check.tools {
            output.indent(&format!("{} -> {}", tool.program, tool.path.display()));
        }
    } else {
        output.error(&format!(
            "{}: {}",
            check.target,
            check.error.as_deref().unwrap_or("check failed")
        ));
        if let Some(hint) = &check.hint {
            output.error_detail(hint);
        }
    }
}

/// Outcome of `clean` for one target.
#[derive(Debug, Serialize)]
pub struct CleanReport {
    pub target: TargetKind,
    pub removed: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn print_clean(output: &OutputManager, clean: &CleanReport) {
    output.success(&format!("{}: cleaned", clean.target));
    for dir in &clean.removed {
        output.indent(dir);
    }
    for warning in &clean.warnings {
        output.warn(warning);
    }
}

/// Writes `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(output: &OutputManager, value: &T) -> Result<()> {
    output.raw(&serde_json::to_string_pretty(value)?);
    Ok(())
}
