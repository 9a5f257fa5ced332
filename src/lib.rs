//! Release packaging pipeline for the WebShell browser.
//!
//! Builds four distributables from one source tree:
//! - a single-file executable (`onefile`)
//! - a portable folder and its zip archive (`portable`)
//! - a Windows setup executable compiled by NSIS (`installer`)
//! - a Linux AppImage (`appimage`)
//!
//! The engine lives in [`bundler`] and can be used without the command line
//! front end in [`cli`].

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, PackagerError, Result};
