//! Portable folder: run-in-place distribution.

use super::{AssemblyContext, file_name};
use crate::bundler::{
    builder::Artifact,
    error::{ErrorExt, Result},
    utils::fs,
};
use std::path::{Path, PathBuf};

const LAUNCH_SH: &str = r#"#!/bin/sh
# Starts {{name}} {{version}} from this folder.
cd "$(dirname "$0")" || exit 1
exec "./{{exe_name}}" "$@"
"#;

const LAUNCH_BAT: &str = r#"@echo off
rem Starts {{name}} {{version}} from this folder.
cd /d "%~dp0"
start "" "{{exe_name}}" %*
"#;

const USAGE_NOTE: &str = r#"{{name}} {{version}} (portable)

{{description}}

No installation is required. Keep every file in this folder together.

To start:
  Linux / macOS   ./start.sh   (or run ./{{exe_name}} directly)
  Windows         start.bat    (or double-click {{exe_name}})

To remove, delete the folder.
"#;

pub(super) async fn assemble(
    primary: &Artifact,
    extra_files: &[PathBuf],
    destination: &Path,
    cx: &AssemblyContext<'_>,
) -> Result<()> {
    fs::create_dir_all(destination).await?;

    let exe = destination.join(file_name(&primary.path)?);
    fs::copy_file(&primary.path, &exe).await?;
    fs::set_executable(&exe).await?;

    for extra in extra_files {
        fs::copy_file(extra, &destination.join(file_name(extra)?)).await?;
    }

    if cfg!(windows) {
        let script = cx.vars.render(LAUNCH_BAT)?.replace('\n', "\r\n");
        write(&destination.join("start.bat"), &script).await?;
    } else {
        let launcher = destination.join("start.sh");
        write(&launcher, &cx.vars.render(LAUNCH_SH)?).await?;
        fs::set_executable(&launcher).await?;
    }

    write(&destination.join("README.txt"), &cx.vars.render(USAGE_NOTE)?).await?;
    log::debug!("Portable folder ready at {}", destination.display());
    Ok(())
}

async fn write(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .fs_context("writing portable file", path)
}
