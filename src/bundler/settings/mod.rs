//! Configuration structures for packaging runs.
//!
//! [`Settings`] is the validated, immutable view every target reads from;
//! it is produced by [`SettingsBuilder`], usually fed from `packaging.toml`.

mod builder;
mod core;
mod manifest;
mod package;
mod tools;

pub use builder::SettingsBuilder;
pub use core::Settings;
pub use manifest::{Manifest, ManifestEntry};
pub use package::PackageSettings;
pub use tools::{ToolRole, ToolSettings, ToolsSettings};
