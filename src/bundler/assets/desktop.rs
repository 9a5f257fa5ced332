//! freedesktop.org desktop entry generation.

use crate::bundler::error::{ErrorExt, Result};
use std::{fmt::Write as _, path::Path};

/// Fields of a generated `.desktop` file.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: String,
    pub icon: String,
    pub categories: String,
    pub comment: Option<String>,
}

impl DesktopEntry {
    /// Renders the entry as desktop-file text.
    pub fn render(&self) -> String {
        let mut out = String::from("[Desktop Entry]\nType=Application\n");
        let _ = writeln!(out, "Name={}", self.name);
        let _ = writeln!(out, "Exec={}", self.exec);
        let _ = writeln!(out, "Icon={}", self.icon);
        // Category lists are semicolon terminated.
        let categories = self.categories.trim_end_matches(';');
        let _ = writeln!(out, "Categories={categories};");
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.is_empty()) {
            let _ = writeln!(out, "Comment={comment}");
        }
        out.push_str("Terminal=false\n");
        out
    }
}

/// Writes `entry` to `path`.
pub async fn write_desktop_entry(entry: &DesktopEntry, path: &Path) -> Result<()> {
    tokio::fs::write(path, entry.render())
        .await
        .fs_context("writing desktop entry", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_required_fields() {
        let entry = DesktopEntry {
            name: "WebShell".into(),
            exec: "WebShell".into(),
            icon: "WebShell".into(),
            categories: "Network;WebBrowser".into(),
            comment: None,
        };
        let text = entry.render();
        assert!(text.starts_with("[Desktop Entry]\n"));
        for line in [
            "Name=WebShell",
            "Exec=WebShell",
            "Icon=WebShell",
            "Categories=Network;WebBrowser;",
            "Terminal=false",
        ] {
            assert!(text.lines().any(|l| l == line), "missing {line}");
        }
        assert!(!text.contains("Comment="));
    }
}
