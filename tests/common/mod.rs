//! Shared fixtures: a small source tree and fake external tools written as
//! shell scripts on a private search path.

#![allow(dead_code)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use webshell_packager::bundler::{Manifest, PackageSettings, Settings, SettingsBuilder};

/// Writes `<distpath>/<name>` like the real packager does.
pub const FAKE_PACKAGER: &str = r#"#!/bin/sh
dist=""
name=""
while [ $# -gt 0 ]; do
  case "$1" in
    --distpath) dist="$2"; shift 2 ;;
    --name) name="$2"; shift 2 ;;
    *) shift ;;
  esac
done
mkdir -p "$dist"
printf 'fake executable for %s\n' "$name" > "$dist/$name"
echo "built $name"
"#;

/// Fails the way the packager does on a missing module.
pub const FAILING_PACKAGER: &str = r#"#!/bin/sh
echo "analysing entry point"
echo "ModuleNotFoundError: No module named 'PyQt5'" >&2
exit 1
"#;

/// Exits 0 without producing anything.
pub const SILENT_PACKAGER: &str = "#!/bin/sh\necho done\n";

/// Never finishes on its own.
pub const HANGING_PACKAGER: &str = "#!/bin/sh\necho starting\nsleep 30\n";

/// Writes the file named by `-DOUTPUT_FILE=`.
pub const FAKE_MAKENSIS: &str = r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    -DOUTPUT_FILE=*) out="${arg#-DOUTPUT_FILE=}" ;;
  esac
done
printf 'MZ fake setup\n' > "$out"
"#;

/// Writes its last argument.
pub const FAKE_APPIMAGETOOL: &str = r#"#!/bin/sh
for arg in "$@"; do out="$arg"; done
printf 'ELF fake appimage for %s\n' "$ARCH" > "$out"
"#;

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Source tree with an entry point, two web resources, an icon set and
    /// a README; empty tool directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        let src = fixture.source();
        std::fs::create_dir_all(src.join("icons")).unwrap();
        std::fs::create_dir_all(fixture.tools()).unwrap();
        std::fs::write(src.join("main.py"), "print('webshell')\n").unwrap();
        std::fs::write(src.join("index.html"), "<html></html>\n").unwrap();
        std::fs::write(src.join("about.html"), "<html>about</html>\n").unwrap();
        std::fs::write(src.join("icons/back.png"), "png").unwrap();
        std::fs::write(src.join("icons/forward.png"), "png").unwrap();
        std::fs::write(src.join("README.md"), "# WebShell\n").unwrap();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("webshell")
    }

    pub fn tools(&self) -> PathBuf {
        self.dir.path().join("tools")
    }

    /// Installs an executable script named `name` on the search path.
    pub fn tool(&self, name: &str, script: &str) -> &Self {
        let path = self.tools().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    pub fn builder(&self) -> SettingsBuilder {
        SettingsBuilder::new()
            .source_root(self.source())
            .package_settings(PackageSettings {
                product_name: "WebShell".into(),
                version: "1.0.0".into(),
                description: "Minimal browser".into(),
                ..Default::default()
            })
            .manifest(Manifest::new([("*.html", "."), ("icons/*.png", "icons/")]))
            .auxiliary_files(vec![PathBuf::from("README.md")])
            .tool_search_path(self.tools())
    }

    pub fn settings(&self) -> Settings {
        self.builder().build().unwrap()
    }
}
