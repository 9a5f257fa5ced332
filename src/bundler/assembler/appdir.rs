//! AppDir layout for the AppImage tool.
//!
//! ```text
//! <Name>.AppDir/
//!   AppRun
//!   <name>.desktop
//!   <name>.png
//!   .DirIcon -> <name>.png
//!   usr/bin/<exe>
//!   usr/share/applications/<name>.desktop
//!   usr/share/icons/<name>.png
//!   usr/share/doc/<name>/<auxiliary files>
//! ```

use super::{AssemblyContext, file_name};
use crate::bundler::{
    assets::{DesktopEntry, write_desktop_entry},
    builder::Artifact,
    error::{Error, ErrorExt, Result},
    utils::fs,
};
use std::path::{Path, PathBuf};

const APP_RUN: &str = r#"#!/bin/sh
HERE="$(dirname "$(readlink -f "$0")")"
export PATH="$HERE/usr/bin:$PATH"
exec "$HERE/usr/bin/{{exe_name}}" "$@"
"#;

pub(super) async fn assemble(
    primary: &Artifact,
    extra_files: &[PathBuf],
    destination: &Path,
    cx: &AssemblyContext<'_>,
) -> Result<()> {
    let settings = cx.settings;
    let name = settings.product_name();

    let usr = destination.join("usr");
    let bin_dir = usr.join("bin");
    let applications = usr.join("share/applications");
    let icons = usr.join("share/icons");
    let docs = usr.join("share/doc").join(name);
    for dir in [&bin_dir, &applications, &icons] {
        fs::create_dir_all(dir).await?;
    }

    let exe = bin_dir.join(file_name(&primary.path)?);
    fs::copy_file(&primary.path, &exe).await?;
    fs::set_executable(&exe).await?;

    let icon_source = PathBuf::from(cx.vars.get("icon_png").ok_or_else(|| {
        Error::Config("template variable `icon_png` is not set".to_string())
    })?);
    let icon_name = format!("{name}.png");
    fs::copy_file(&icon_source, &icons.join(&icon_name)).await?;
    fs::copy_file(&icon_source, &destination.join(&icon_name)).await?;

    let entry = DesktopEntry {
        name: name.to_string(),
        exec: settings.exe_name(),
        icon: name.to_string(),
        categories: settings.package().category.clone(),
        comment: Some(settings.description().to_string()),
    };
    let desktop_name = format!("{name}.desktop");
    write_desktop_entry(&entry, &applications.join(&desktop_name)).await?;
    write_desktop_entry(&entry, &destination.join(&desktop_name)).await?;

    #[cfg(unix)]
    {
        let dir_icon = destination.join(".DirIcon");
        tokio::fs::symlink(&icon_name, &dir_icon)
            .await
            .fs_context("creating .DirIcon", &dir_icon)?;
    }
    #[cfg(not(unix))]
    fs::copy_file(&icon_source, &destination.join(".DirIcon")).await?;

    let app_run = destination.join("AppRun");
    tokio::fs::write(&app_run, cx.vars.render(APP_RUN)?)
        .await
        .fs_context("writing AppRun", &app_run)?;
    fs::set_executable(&app_run).await?;

    if !extra_files.is_empty() {
        fs::create_dir_all(&docs).await?;
        for extra in extra_files {
            fs::copy_file(extra, &docs.join(file_name(extra)?)).await?;
        }
    }

    log::debug!("AppDir ready at {}", destination.display());
    Ok(())
}
