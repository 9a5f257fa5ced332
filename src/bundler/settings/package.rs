//! Application metadata.

/// Application metadata used by every target.
///
/// Maps from the `[package]` table of `packaging.toml`.
///
/// # Examples
///
/// ```no_run
/// use webshell_packager::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "WebShell".into(),
///     version: "1.2.0".into(),
///     description: "A small desktop browser".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Product name displayed to users.
    ///
    /// Also the executable base name and the prefix of every artifact file name.
    #[serde(rename = "name")]
    pub product_name: String,

    /// Version string, e.g. "1.2.0".
    pub version: String,

    /// Brief description of the application.
    ///
    /// Used in the desktop entry comment and installer metadata.
    pub description: String,

    /// Publisher shown by the installer.
    ///
    /// Default: None
    pub publisher: Option<String>,

    /// Homepage URL for the application.
    ///
    /// Default: None
    pub homepage: Option<String>,

    /// Application entry point handed to the packager, relative to the source root.
    pub entry_point: String,

    /// freedesktop.org category for the desktop entry.
    pub category: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            version: "0.1.0".to_string(),
            description: String::new(),
            publisher: None,
            homepage: None,
            entry_point: "main.py".to_string(),
            category: "Network".to_string(),
        }
    }
}
