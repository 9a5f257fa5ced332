//! Installer payload assembly.
//!
//! Lays out the fixed directory the installer compiler consumes:
//!
//! ```text
//! <installer_dir>/
//!   payload/<exe>
//!   payload/<auxiliary files>
//!   installer.nsi
//! ```
//!
//! The compiler itself runs as the next stage; `OUTPUT_FILE` is passed on its
//! command line so the script does not hard-code the output path.

mod script;
mod template;
mod utils;

pub use utils::format_version_for_nsis;

use super::{AssemblyContext, file_name};
use crate::bundler::{builder::Artifact, error::Result, utils::fs};
use std::path::{Path, PathBuf};

pub(super) async fn assemble(
    primary: &Artifact,
    extra_files: &[PathBuf],
    destination: &Path,
    cx: &AssemblyContext<'_>,
) -> Result<()> {
    let payload_dir = destination.join("payload");
    fs::create_dir_all(&payload_dir).await?;

    let mut payload = Vec::with_capacity(extra_files.len() + 1);
    for source in std::iter::once(&primary.path).chain(extra_files) {
        let dest = payload_dir.join(file_name(source)?);
        fs::copy_file(source, &dest).await?;
        payload.push(dest);
    }

    let script = script::generate_nsi_script(cx, destination, &payload).await?;
    log::info!(
        "Installer payload ready: {} file(s), script {}",
        payload.len(),
        script.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        PackageSettings, SettingsBuilder, TargetKind,
        assets::{self, AssetKind},
        target::BuildTarget,
    };

    #[tokio::test]
    async fn payload_and_script_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "MIT").unwrap();
        let settings = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings {
                product_name: "WebShell".into(),
                version: "1.4.2".into(),
                publisher: Some("Shell \"Works\"".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        let target = BuildTarget::new(TargetKind::Installer, &settings, None);
        let vars = target.template_vars(&settings);
        for kind in [AssetKind::IconIco, AssetKind::WizardSidebar, AssetKind::WizardHeader] {
            assets::ensure(kind, &settings.assets_dir().join(kind.file_name()), "prepare")
                .await
                .unwrap();
        }

        let exe = target.build_dir().join("dist").join(settings.exe_name());
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, "binary").unwrap();
        let primary = Artifact::new(exe, 6, "00".into(), "verify");

        let installer_dir = PathBuf::from(vars.get("installer_dir").unwrap());
        let cx = AssemblyContext {
            settings: &settings,
            vars: &vars,
            stage: "assemble:installer-payload",
        };
        assemble(&primary, &[dir.path().join("LICENSE")], &installer_dir, &cx)
            .await
            .unwrap();

        assert!(installer_dir.join("payload").join(settings.exe_name()).is_file());
        assert!(installer_dir.join("payload/LICENSE").is_file());

        let bytes = std::fs::read(installer_dir.join("installer.nsi")).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let nsi = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(nsi.contains("VIProductVersion \"1.4.2.0\""));
        assert!(nsi.contains("OutFile \"${OUTPUT_FILE}\""));
        assert!(nsi.contains(&format!("$INSTDIR\\{}", settings.exe_name())));
        assert!(nsi.contains("!insertmacro MUI_PAGE_LICENSE"));
        assert!(nsi.contains("Shell $\\\"Works$\\\""));
        assert!(nsi.contains(vars.get("wizard_sidebar").unwrap()));
    }

    #[tokio::test]
    async fn product_name_is_quoted_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .source_root(dir.path())
            .package_settings(PackageSettings {
                product_name: "Web\"Shell $PLUGINSDIR".into(),
                ..Default::default()
            })
            .build()
            .unwrap();
        let target = BuildTarget::new(TargetKind::Installer, &settings, None);
        let vars = target.template_vars(&settings);
        for kind in [AssetKind::IconIco, AssetKind::WizardSidebar, AssetKind::WizardHeader] {
            assets::ensure(kind, &settings.assets_dir().join(kind.file_name()), "prepare")
                .await
                .unwrap();
        }
        let exe = target.build_dir().join("dist").join(settings.exe_name());
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, "binary").unwrap();
        let primary = Artifact::new(exe, 6, "00".into(), "verify");

        let installer_dir = PathBuf::from(vars.get("installer_dir").unwrap());
        let cx = AssemblyContext {
            settings: &settings,
            vars: &vars,
            stage: "assemble:installer-payload",
        };
        assemble(&primary, &[], &installer_dir, &cx).await.unwrap();

        let bytes = std::fs::read(installer_dir.join("installer.nsi")).unwrap();
        let nsi = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let quoted = "Web$\\\"Shell $$PLUGINSDIR";
        assert!(nsi.contains(&format!("InstallDir \"$LOCALAPPDATA\\Programs\\{quoted}\"")));
        assert!(nsi.contains(&format!("DeleteRegKey HKCU \"Software\\{quoted}\"")));
        assert!(nsi.contains(&format!("$DESKTOP\\{quoted}.lnk")));
        assert!(!nsi.contains("Web\"Shell"));
    }
}
