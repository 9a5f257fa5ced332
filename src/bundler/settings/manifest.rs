//! Declarative resource manifest: glob pattern to staging destination.

use crate::bundler::error::{Error, ErrorExt, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use std::{fmt, path::Path};

/// One manifest rule.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ManifestEntry {
    /// Glob pattern relative to the source root.
    pub pattern: String,
    /// Destination directory relative to the staging root.
    #[serde(alias = "dest")]
    pub destination: String,
}

/// Ordered glob-to-destination mapping used by the resource stager.
///
/// Accepts either a table (`"*.html" = "."`) or an array of
/// `{ pattern, destination }` tables. Document order is kept in both forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Builds a manifest from `(pattern, destination)` pairs, in order.
    pub fn new<I, P, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, d)| ManifestEntry {
                    pattern: p.into(),
                    destination: d.into(),
                })
                .collect(),
        }
    }

    /// Resource rules a browser shell ships when nothing is configured.
    pub fn default_web_resources() -> Self {
        Self::new([
            ("*.html", "."),
            ("*.css", "."),
            ("*.js", "."),
            ("icons/*.png", "icons/"),
        ])
    }

    /// Loads a standalone manifest file (`.json` or `.toml`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).fs_context("reading manifest", path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let manifest: Manifest = if is_json {
            serde_json::from_str(&raw).map_err(|e| {
                Error::Config(format!("invalid manifest {}: {e}", path.display()))
            })?
        } else {
            toml::from_str(&raw).map_err(|e| {
                Error::Config(format!("invalid manifest {}: {e}", path.display()))
            })?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Rejects patterns that escape the source root or cannot compile.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            if entry.pattern.trim().is_empty() {
                return Err(Error::Config("manifest pattern cannot be empty".into()));
            }
            glob::Pattern::new(&entry.pattern).map_err(|e| {
                Error::Config(format!("invalid manifest pattern `{}`: {e}", entry.pattern))
            })?;
            for value in [&entry.pattern, &entry.destination] {
                let p = Path::new(value);
                if p.is_absolute()
                    || p.components()
                        .any(|c| matches!(c, std::path::Component::ParentDir))
                {
                    return Err(Error::Config(format!(
                        "manifest paths must stay relative to their root: `{value}`"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rules in declaration order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

impl<'de> serde::Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = Manifest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of glob = destination, or an array of { pattern, destination }")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Manifest, A::Error> {
                let mut entries = Vec::new();
                while let Some((pattern, destination)) = map.next_entry::<String, String>()? {
                    if entries.iter().any(|e: &ManifestEntry| e.pattern == pattern) {
                        return Err(de::Error::custom(format!("duplicate manifest pattern `{pattern}`")));
                    }
                    entries.push(ManifestEntry { pattern, destination });
                }
                Ok(Manifest { entries })
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Manifest, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = seq.next_element::<ManifestEntry>()? {
                    entries.push(entry);
                }
                Ok(Manifest { entries })
            }
        }

        deserializer.deserialize_any(ManifestVisitor)
    }
}
