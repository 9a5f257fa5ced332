//! External tool resolution.
//!
//! Each tool is looked up once per run and the resolved path cached, so every
//! invocation of the same tool within a run uses the same executable.

use crate::bundler::{
    error::{Error, Result},
    settings::ToolSettings,
};
use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// PATH-style lookup with a per-run cache.
#[derive(Debug, Clone)]
pub struct ToolResolver {
    search_path: Option<OsString>,
    cwd: PathBuf,
    cache: BTreeMap<String, PathBuf>,
}

impl ToolResolver {
    /// `search_path` replaces `PATH` when set; relative program paths resolve
    /// against `cwd`.
    pub fn new(search_path: Option<&OsStr>, cwd: &Path) -> Self {
        Self {
            search_path: search_path.map(OsStr::to_os_string),
            cwd: cwd.to_path_buf(),
            cache: BTreeMap::new(),
        }
    }

    /// Resolves `tool.program`, consulting the cache first.
    ///
    /// # Errors
    ///
    /// [`Error::MissingDependency`] with the configured install hint.
    pub fn resolve(&mut self, tool: &ToolSettings) -> Result<PathBuf> {
        if let Some(path) = self.cache.get(&tool.program) {
            return Ok(path.clone());
        }

        let paths = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));

        match which::which_in(&tool.program, paths, &self.cwd) {
            Ok(path) => {
                log::debug!("Resolved {} -> {}", tool.program, path.display());
                self.cache.insert(tool.program.clone(), path.clone());
                Ok(path)
            }
            Err(e) => {
                log::debug!("{} not found: {e}", tool.program);
                Err(Error::MissingDependency {
                    tool: tool.program.clone(),
                    hint: tool.install_hint.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tool(program: &str) -> ToolSettings {
        ToolSettings {
            program: program.to_string(),
            timeout: Duration::from_secs(1),
            install_hint: "Install it from example.org.".to_string(),
            extra_args: Vec::new(),
        }
    }

    #[test]
    fn missing_tool_carries_hint() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = ToolResolver::new(Some(dir.path().as_os_str()), dir.path());
        let err = resolver.resolve(&tool("definitely-not-installed")).unwrap_err();
        match err {
            Error::MissingDependency { tool, hint } => {
                assert_eq!(tool, "definitely-not-installed");
                assert!(hint.contains("example.org"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn resolves_from_injected_search_path_and_caches() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fake-tool");
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut resolver = ToolResolver::new(Some(dir.path().as_os_str()), dir.path());
        assert_eq!(resolver.resolve(&tool("fake-tool")).unwrap(), exe);

        // Cached: still resolves after the file disappears.
        std::fs::remove_file(&exe).unwrap();
        assert_eq!(resolver.resolve(&tool("fake-tool")).unwrap(), exe);
    }
}
