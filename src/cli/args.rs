//! Command line argument parsing and validation.

use crate::bundler::TargetKind;
use clap::{Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf};

/// Release packaging pipeline for the WebShell browser
#[derive(Parser, Debug)]
#[command(
    name = "webshell_packager",
    version,
    about = "Release packaging pipeline: onefile, portable, installer and AppImage targets",
    long_about = "Turns the application sources and resource files into distributables.

Each target resolves its external tools first, cleans its own build and output
directories, then runs its stages in order and stops at the first failure.

Usage:
  webshell_packager onefile
  webshell_packager portable --output-dir /tmp/release
  webshell_packager installer --timeout 1200 --json
  webshell_packager check

Exit code 0 = every requested target succeeded and its artifacts were verified."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Source tree root (never cleaned)
    #[arg(short = 's', long, value_name = "DIR", default_value = ".", global = true)]
    pub source: PathBuf,

    /// Configuration file (default: <source>/packaging.toml if present)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Standalone resource manifest (.toml or .json), replaces [manifest]
    #[arg(short = 'm', long, value_name = "FILE", global = true)]
    pub manifest: Option<PathBuf>,

    /// Output directory for the target (for `all`: parent of each target's directory)
    #[arg(short = 'o', long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Timeout in seconds applied to every external tool invocation
    #[arg(
        short = 't',
        long,
        value_name = "SECS",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Search path for external tools instead of PATH
    #[arg(long, value_name = "PATH", env = "WEBSHELL_PACKAGER_TOOL_PATH", global = true)]
    pub tool_path: Option<OsString>,

    /// Print the report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// What to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Single-file executable
    Onefile,
    /// Portable folder and zip archive
    Portable,
    /// Setup executable
    Installer,
    /// Linux AppImage
    Appimage,
    /// Every target, one after another, each with its own directories
    All,
    /// Remove a target's build and output directories
    Clean {
        #[arg(value_parser = parse_target)]
        target: TargetKind,
    },
    /// Resolve the tools a target needs without building
    Check {
        /// Target to check (default: all)
        #[arg(value_parser = parse_target)]
        target: Option<TargetKind>,
    },
}

fn parse_target(s: &str) -> Result<TargetKind, String> {
    s.parse()
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Targets selected by the command, in run order.
    pub fn targets(&self) -> Vec<TargetKind> {
        match &self.command {
            Command::Onefile => vec![TargetKind::OneFile],
            Command::Portable => vec![TargetKind::Portable],
            Command::Installer => vec![TargetKind::Installer],
            Command::Appimage => vec![TargetKind::AppImage],
            Command::All | Command::Check { target: None } => TargetKind::ALL.to_vec(),
            Command::Clean { target } | Command::Check { target: Some(target) } => vec![*target],
        }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.source.as_os_str().is_empty() {
            return Err("Source cannot be empty".to_string());
        }
        if let Some(manifest) = &self.manifest {
            let ext = manifest.extension().and_then(|e| e.to_str()).unwrap_or_default();
            if !matches!(ext.to_ascii_lowercase().as_str(), "toml" | "json") {
                return Err(format!(
                    "Manifest {} must be a .toml or .json file",
                    manifest.display()
                ));
            }
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    json: bool,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet || args.json),
            json: args.json,
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Whether reports go to stdout as JSON.
    pub fn json(&self) -> bool {
        self.json
    }
}
