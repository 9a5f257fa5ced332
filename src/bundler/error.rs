//! Error taxonomy for pipeline stages.
//!
//! Every stage reports its failure through [`Error`]; only the orchestrator
//! decides whether the run halts. [`ErrorKind`] is the fieldless mirror used in
//! reports and for process exit codes.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool could not be resolved on the search path.
    #[error("required tool `{tool}` was not found on PATH. {hint}")]
    MissingDependency {
        /// Tool program name.
        tool: String,
        /// Actionable install suggestion.
        hint: String,
    },

    /// Copying a manifest match into the staging root failed.
    #[error("failed to stage resource {}: {source}", path.display())]
    ResourceStagingFailed {
        /// Source path that could not be staged.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Tool exceeded its time budget and was terminated.
    #[error("`{tool}` timed out after {}s and was terminated", timeout.as_secs())]
    ToolTimeout {
        /// Tool program name.
        tool: String,
        /// Configured timeout.
        timeout: Duration,
        /// Standard output captured before termination.
        stdout: String,
        /// Standard error captured before termination.
        stderr: String,
    },

    /// Tool exited with a non-zero status (or was killed by a signal).
    #[error("`{tool}` failed with exit code {}", exit_code.map_or_else(|| "<signal>".to_string(), |c| c.to_string()))]
    ToolInvocationFailed {
        /// Tool program name.
        tool: String,
        /// Exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A stage claimed success but the expected output is missing or empty.
    #[error("expected artifact was not produced: {}", expected_path.display())]
    ArtifactNotProduced {
        /// Path the artifact should exist at.
        expected_path: PathBuf,
    },

    /// Building a derived distributable failed.
    #[error("assembly failed: {reason}")]
    AssemblyFailed {
        /// Human readable reason.
        reason: String,
    },

    /// Filesystem operation failed.
    #[error("{op} failed for {}: {source}", path.display())]
    FilesystemError {
        /// Operation being performed.
        op: String,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration, manifest, or stage template.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Fieldless error classification for reports and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    MissingDependency,
    ResourceStagingFailed,
    ToolTimeout,
    ToolInvocationFailed,
    ArtifactNotProduced,
    AssemblyFailed,
    FilesystemError,
    Config,
    Generic,
}

impl ErrorKind {
    /// Process exit code for a run that failed with this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Generic => 1,
            ErrorKind::MissingDependency => 2,
            ErrorKind::ResourceStagingFailed => 3,
            ErrorKind::ToolTimeout => 4,
            ErrorKind::ToolInvocationFailed => 5,
            ErrorKind::ArtifactNotProduced => 6,
            ErrorKind::AssemblyFailed => 7,
            ErrorKind::FilesystemError => 8,
            ErrorKind::Config => 9,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Error {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingDependency { .. } => ErrorKind::MissingDependency,
            Error::ResourceStagingFailed { .. } => ErrorKind::ResourceStagingFailed,
            Error::ToolTimeout { .. } => ErrorKind::ToolTimeout,
            Error::ToolInvocationFailed { .. } => ErrorKind::ToolInvocationFailed,
            Error::ArtifactNotProduced { .. } => ErrorKind::ArtifactNotProduced,
            Error::AssemblyFailed { .. } => ErrorKind::AssemblyFailed,
            Error::FilesystemError { .. } => ErrorKind::FilesystemError,
            Error::Config(_) => ErrorKind::Config,
            Error::GenericError(_) => ErrorKind::Generic,
        }
    }

    /// External tool involved in the failure, if any.
    pub fn tool(&self) -> Option<&str> {
        match self {
            Error::MissingDependency { tool, .. }
            | Error::ToolTimeout { tool, .. }
            | Error::ToolInvocationFailed { tool, .. } => Some(tool),
            _ => None,
        }
    }

    /// Captured tool output worth showing after the summary line.
    pub fn diagnostics(&self) -> Option<String> {
        let (stdout, stderr) = match self {
            Error::ToolTimeout { stdout, stderr, .. }
            | Error::ToolInvocationFailed { stdout, stderr, .. } => (stdout, stderr),
            _ => return None,
        };
        let mut out = String::new();
        if !stderr.trim().is_empty() {
            out.push_str(stderr.trim_end());
        }
        if !stdout.trim().is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(stdout.trim_end());
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Wraps I/O failures with the operation and path that caused them.
pub trait ErrorExt<T> {
    /// Converts the error into [`Error::FilesystemError`].
    fn fs_context(self, op: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, op: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::FilesystemError {
            op: op.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Turns a missing value into [`Error::GenericError`].
pub trait Context<T> {
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::Generic,
            ErrorKind::MissingDependency,
            ErrorKind::ResourceStagingFailed,
            ErrorKind::ToolTimeout,
            ErrorKind::ToolInvocationFailed,
            ErrorKind::ArtifactNotProduced,
            ErrorKind::AssemblyFailed,
            ErrorKind::FilesystemError,
            ErrorKind::Config,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn diagnostics_prefer_stderr_then_stdout() {
        let err = Error::ToolInvocationFailed {
            tool: "makensis".into(),
            exit_code: Some(1),
            stdout: "processing script\n".into(),
            stderr: "Error in script line 4\n".into(),
        };
        assert_eq!(
            err.diagnostics().as_deref(),
            Some("Error in script line 4\nprocessing script")
        );
        assert_eq!(err.tool(), Some("makensis"));
        assert_eq!(err.kind().exit_code(), 5);
    }

    #[test]
    fn fs_context_keeps_path() {
        let res: std::io::Result<()> = Err(std::io::Error::other("disk full"));
        let err = res.fs_context("writing icon", "/tmp/icon.ico").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
        assert!(err.to_string().contains("/tmp/icon.ico"));
    }
}
