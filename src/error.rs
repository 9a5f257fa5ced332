//! Top-level error types for the command line tool.
//!
//! Pipeline failures are [`crate::bundler::Error`]; this module wraps them
//! together with argument, I/O and configuration-file errors and maps each to
//! a process exit code.

use crate::bundler::ErrorKind;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Exit code for command line usage errors.
pub const EXIT_USAGE: i32 = 64;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum PackagerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file parse errors
    #[error("invalid configuration file {path}: {source}")]
    Toml {
        /// File that failed to parse
        path: String,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// Pipeline errors
    #[error(transparent)]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl PackagerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PackagerError::Cli(_) => EXIT_USAGE,
            PackagerError::Io(_) => ErrorKind::FilesystemError.exit_code(),
            PackagerError::Json(_) => ErrorKind::Generic.exit_code(),
            PackagerError::Toml { .. } => ErrorKind::Config.exit_code(),
            PackagerError::Bundler(e) => e.kind().exit_code(),
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;
        match self {
            PackagerError::Bundler(Error::MissingDependency { tool, hint }) => vec![
                hint.clone(),
                format!("Or point `[tools]` in packaging.toml at an existing `{tool}`"),
            ],
            PackagerError::Bundler(Error::Config(_)) | PackagerError::Toml { .. } => {
                vec!["Check packaging.toml and the --config/--manifest arguments".to_string()]
            }
            PackagerError::Cli(_) => vec!["Run with --help for usage".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
