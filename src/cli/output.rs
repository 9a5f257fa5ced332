//! Terminal output for the command line tool.
//!
//! Progress and results go to stdout, warnings and errors to stderr. Quiet
//! mode suppresses everything on stdout except explicit [`OutputManager::raw`]
//! writes (used for JSON).

use std::io::{self, Write};

/// Writes user-facing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Only shown with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.stdout(format_args!("  {message}"));
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.stdout(format_args!("✓ {message}"));
        }
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            self.stdout(format_args!("\n{title}"));
        }
    }

    /// Indented detail line under the previous message.
    pub fn indent(&self, message: &str) {
        if !self.quiet {
            self.stdout(format_args!("    {message}"));
        }
    }

    pub fn warn(&self, message: &str) {
        self.stderr(format_args!("warning: {message}"));
    }

    pub fn error(&self, message: &str) {
        self.stderr(format_args!("error: {message}"));
    }

    /// Indented detail line on stderr, shown even when quiet.
    pub fn error_detail(&self, message: &str) {
        self.stderr(format_args!("    {message}"));
    }

    /// Unconditional stdout write.
    pub fn raw(&self, text: &str) {
        self.stdout(format_args!("{text}"));
    }

    fn stdout(&self, args: std::fmt::Arguments<'_>) {
        // A closed pipe must not abort the run.
        let _ = writeln!(io::stdout().lock(), "{args}");
    }

    fn stderr(&self, args: std::fmt::Arguments<'_>) {
        let _ = writeln!(io::stderr().lock(), "{args}");
    }
}
