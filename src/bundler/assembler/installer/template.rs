//! Installer script template.
//!
//! Values that sit right after a backslash in the generated script are
//! precomputed by the caller; handlebars treats `\{{` as an escaped brace.

pub const NSI_TEMPLATE: &str = r#"; {{product_name}} {{version}} installer
Unicode true
SetCompressor /SOLID lzma

!include "MUI2.nsh"

!ifndef OUTPUT_FILE
  !define OUTPUT_FILE "{{default_output}}"
!endif

Name "{{product_name}}"
OutFile "${OUTPUT_FILE}"
InstallDir "{{install_dir}}"
InstallDirRegKey HKCU "{{reg_key}}" "InstallDir"
RequestExecutionLevel user

VIProductVersion "{{version_nsis}}"
VIAddVersionKey "ProductName" "{{product_name}}"
VIAddVersionKey "ProductVersion" "{{version}}"
VIAddVersionKey "FileVersion" "{{version}}"
VIAddVersionKey "FileDescription" "{{description}}"
VIAddVersionKey "CompanyName" "{{publisher}}"
VIAddVersionKey "LegalCopyright" "{{publisher}}"

!define MUI_ICON "{{installer_icon}}"
!define MUI_UNICON "{{installer_icon}}"
!define MUI_WELCOMEFINISHPAGE_BITMAP "{{sidebar_image}}"
!define MUI_UNWELCOMEFINISHPAGE_BITMAP "{{sidebar_image}}"
!define MUI_HEADERIMAGE
!define MUI_HEADERIMAGE_BITMAP "{{header_image}}"
!define MUI_ABORTWARNING
!define MUI_FINISHPAGE_RUN "{{installed_exe}}"

!insertmacro MUI_PAGE_WELCOME
{{#if license_file}}
!insertmacro MUI_PAGE_LICENSE "{{license_file}}"
{{/if}}
!insertmacro MUI_PAGE_DIRECTORY
!insertmacro MUI_PAGE_INSTFILES
!insertmacro MUI_PAGE_FINISH

!insertmacro MUI_UNPAGE_CONFIRM
!insertmacro MUI_UNPAGE_INSTFILES

!insertmacro MUI_LANGUAGE "English"

Section "Install"
  SetOutPath "$INSTDIR"
{{#each payload_files}}
  File "{{this}}"
{{/each}}
  WriteUninstaller "{{uninstaller}}"

  CreateDirectory "{{startmenu_dir}}"
  CreateShortcut "{{startmenu_shortcut}}" "{{installed_exe}}"
  CreateShortcut "{{desktop_shortcut}}" "{{installed_exe}}"

  WriteRegStr HKCU "{{reg_key}}" "InstallDir" "$INSTDIR"
  WriteRegStr HKCU "{{uninstall_key}}" "DisplayName" "{{product_name}}"
  WriteRegStr HKCU "{{uninstall_key}}" "DisplayVersion" "{{version}}"
  WriteRegStr HKCU "{{uninstall_key}}" "Publisher" "{{publisher}}"
  WriteRegStr HKCU "{{uninstall_key}}" "DisplayIcon" "{{installed_exe}}"
  WriteRegStr HKCU "{{uninstall_key}}" "UninstallString" "$\"{{uninstaller}}$\""
  WriteRegDWORD HKCU "{{uninstall_key}}" "NoModify" 1
  WriteRegDWORD HKCU "{{uninstall_key}}" "NoRepair" 1
SectionEnd

Section "Uninstall"
{{#each installed_files}}
  Delete "{{this}}"
{{/each}}
  Delete "{{uninstaller}}"
  Delete "{{startmenu_shortcut}}"
  Delete "{{desktop_shortcut}}"
  RMDir "{{startmenu_dir}}"
  RMDir "$INSTDIR"

  DeleteRegKey HKCU "{{uninstall_key}}"
  DeleteRegKey HKCU "{{reg_key}}"
SectionEnd
"#;
