//! Installer script generation.

use super::{
    template::NSI_TEMPLATE,
    utils::{format_version_for_nsis, nsis_quote, write_utf8_bom},
};
use crate::bundler::{
    assembler::AssemblyContext,
    error::{Error, Result},
};
use handlebars::Handlebars;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Renders `installer.nsi` into `installer_dir`.
///
/// `payload` holds the absolute paths of the files to install; they land in
/// the install directory under their file names. Every image and icon the
/// script references must already exist.
pub async fn generate_nsi_script(
    cx: &AssemblyContext<'_>,
    installer_dir: &Path,
    payload: &[PathBuf],
) -> Result<PathBuf> {
    let settings = cx.settings;
    let var = |key: &str| {
        cx.vars
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("template variable `{key}` is not set")))
    };

    // Every value lands inside a double-quoted NSIS string.
    let name = nsis_quote(settings.product_name());
    let publisher = nsis_quote(
        settings
            .package()
            .publisher
            .as_deref()
            .unwrap_or(settings.product_name()),
    );
    let exe_name = nsis_quote(&settings.exe_name());
    let quoted_path = |p: &Path| nsis_quote(&p.display().to_string());
    let installed_name = |file: &Path| {
        file.file_name()
            .map(|n| format!("$INSTDIR\\{}", nsis_quote(&n.to_string_lossy())))
    };

    let payload_files: Vec<String> = payload.iter().map(|p| quoted_path(p)).collect();
    let installed_files: Vec<String> = payload.iter().filter_map(|p| installed_name(p)).collect();
    let license_file = payload
        .iter()
        .find(|p| {
            p.file_stem()
                .is_some_and(|s| s.to_string_lossy().eq_ignore_ascii_case("license"))
        })
        .map(|p| quoted_path(p))
        .unwrap_or_default();
    let default_output = format!(
        "{}/{}-{}-setup.exe",
        var("output_dir")?,
        settings.product_name(),
        settings.version_string()
    );

    let data = json!({
        "product_name": name,
        "version": nsis_quote(settings.version_string()),
        "version_nsis": format_version_for_nsis(settings.version_string()),
        "description": nsis_quote(settings.description()),
        "publisher": publisher,
        "default_output": nsis_quote(&default_output),
        "install_dir": format!("$LOCALAPPDATA\\Programs\\{name}"),
        "reg_key": format!("Software\\{name}"),
        "uninstall_key": format!(
            "Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{name}"
        ),
        "installed_exe": format!("$INSTDIR\\{exe_name}"),
        "uninstaller": "$INSTDIR\\uninstall.exe",
        "startmenu_dir": format!("$SMPROGRAMS\\{name}"),
        "startmenu_shortcut": format!("$SMPROGRAMS\\{name}\\{name}.lnk"),
        "desktop_shortcut": format!("$DESKTOP\\{name}.lnk"),
        "installer_icon": nsis_quote(&var("icon_ico")?),
        "sidebar_image": nsis_quote(&var("wizard_sidebar")?),
        "header_image": nsis_quote(&var("wizard_header")?),
        "license_file": license_file,
        "payload_files": payload_files,
        "installed_files": installed_files,
    });

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string("installer.nsi", NSI_TEMPLATE)
        .map_err(|e| Error::GenericError(format!("failed to register installer template: {e}")))?;
    let script = handlebars
        .render("installer.nsi", &data)
        .map_err(|e| Error::GenericError(format!("failed to render installer template: {e}")))?;

    let nsi_path = installer_dir.join("installer.nsi");
    write_utf8_bom(&nsi_path, &script).await?;
    log::debug!("Wrote installer script {}", nsi_path.display());
    Ok(nsi_path)
}
