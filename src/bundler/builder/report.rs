//! Structured result of one pipeline run.

use super::{Artifact, PipelineState};
use crate::bundler::{
    error::{Error, ErrorKind},
    target::TargetKind,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Per-stage status as recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    pub message: String,
    pub duration_ms: u64,
}

/// Why a run failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// Stage that failed (`preflight` and `clean` included).
    pub stage: String,
    pub kind: ErrorKind,
    /// External tool involved, if any.
    pub tool: Option<String>,
    pub message: String,
    /// Captured tool output.
    pub diagnostics: Option<String>,
}

impl FailureReport {
    pub fn new(stage: impl Into<String>, error: &Error) -> Self {
        Self {
            stage: stage.into(),
            kind: error.kind(),
            tool: error.tool().map(str::to_string),
            message: error.to_string(),
            diagnostics: error.diagnostics(),
        }
    }
}

/// Everything a caller needs to know about a finished run.
///
/// `artifacts` is only populated on success. When a run fails, outputs that
/// passed verification before the failure are listed in
/// `verified_before_failure` and are not ready for distribution.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub target: TargetKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failure: Option<FailureReport>,
    pub artifacts: Vec<Artifact>,
    pub verified_before_failure: Vec<Artifact>,
    /// Prepared assets and staged resources.
    pub inputs: Vec<Artifact>,
    pub warnings: Vec<String>,
    pub stages: Vec<StageRecord>,
    pub states: Vec<PipelineState>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// 0 on success, otherwise the failure kind's code.
    pub fn exit_code(&self) -> i32 {
        match &self.failure {
            Some(failure) => failure.kind.exit_code(),
            None => 0,
        }
    }

    /// One line naming the outcome, and on failure the stage and tool.
    pub fn summary_line(&self) -> String {
        match &self.failure {
            None => format!(
                "{} succeeded: {} artifact(s) in {}s",
                self.target,
                self.artifacts.len(),
                self.elapsed_secs()
            ),
            Some(failure) => {
                let tool = failure
                    .tool
                    .as_deref()
                    .map(|t| format!(" (tool: {t})"))
                    .unwrap_or_default();
                format!(
                    "{} failed at stage `{}`{tool}: [{}] {}",
                    self.target, failure.stage, failure.kind, failure.message
                )
            }
        }
    }

    fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
