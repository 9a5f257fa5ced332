//! Installer script helpers.

use crate::bundler::error::{ErrorExt, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Normalizes a version for `VIProductVersion`, which takes exactly four
/// numeric parts.
///
/// - "1" -> "1.0.0.0"
/// - "1.2.3" -> "1.2.3.0"
/// - "1.2.3-beta.1" -> "1.2.3.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
pub fn format_version_for_nsis(version: &str) -> String {
    let core = version.split(['-', '+']).next().unwrap_or_default();
    let mut parts: Vec<String> = core
        .split('.')
        .take(4)
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() { "0".to_string() } else { digits }
        })
        .collect();
    parts.resize(4, "0".to_string());
    parts.join(".")
}

/// Escapes a value for use inside a double-quoted NSIS string.
pub fn nsis_quote(value: &str) -> String {
    value
        .replace('$', "$$")
        .replace('"', "$\\\"")
        .replace(['\r', '\n'], " ")
}

/// Writes `content` prefixed with a UTF-8 byte order mark.
pub async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .fs_context("creating installer script", path)?;

    file.write_all(&[0xEF, 0xBB, 0xBF])
        .await
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .await
        .fs_context("writing installer script", path)?;
    file.flush().await.fs_context("flushing installer script", path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_always_has_four_numeric_parts() {
        assert_eq!(format_version_for_nsis("1"), "1.0.0.0");
        assert_eq!(format_version_for_nsis("1.2"), "1.2.0.0");
        assert_eq!(format_version_for_nsis("1.2.3"), "1.2.3.0");
        assert_eq!(format_version_for_nsis("1.2.3.4.5"), "1.2.3.4");
        assert_eq!(format_version_for_nsis("2.0.0-rc.1"), "2.0.0.0");
        assert_eq!(format_version_for_nsis("v3"), "0.0.0.0");
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(nsis_quote(r#"Say "hi" for $5"#), r#"Say $\"hi$\" for $$5"#);
    }

    #[tokio::test]
    async fn bom_precedes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.nsi");
        write_utf8_bom(&path, "Name \"WebShell\"").await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"Name \"WebShell\"");
    }
}
