//! Resource staging.
//!
//! Expands each manifest pattern against the source root and copies every
//! match under the staging root, keeping the part of its path below the
//! pattern's literal prefix. Copies merge into whatever is already staged.

use crate::bundler::{
    builder::Artifact,
    error::{Error, Result},
    settings::Manifest,
    target::normalize_destination,
    utils::fs,
};
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Copies every manifest match from `source_root` into `staging_root`.
///
/// Matches under any of `exclude` (the pipeline's own build and output
/// directories) are ignored. A pattern with no matches only logs; every
/// destination directory is still created so later stages can rely on it.
///
/// # Errors
///
/// [`Error::ResourceStagingFailed`] naming the source path that could not be
/// read or copied.
pub async fn stage(
    manifest: &Manifest,
    source_root: &Path,
    staging_root: &Path,
    exclude: &[&Path],
    stage: &str,
) -> Result<Vec<Artifact>> {
    fs::create_dir_all(staging_root).await?;

    let mut staged: Vec<Artifact> = Vec::new();
    for entry in manifest.entries() {
        let destination = normalize_destination(&entry.destination);
        let dest_dir = if destination == "." {
            staging_root.to_path_buf()
        } else {
            staging_root.join(&destination)
        };
        fs::create_dir_all(&dest_dir).await?;

        let base = source_root.join(literal_prefix(&entry.pattern));
        let full = format!(
            "{}/{}",
            Pattern::escape(&source_root.to_string_lossy()),
            entry.pattern
        );
        let matches = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| {
            Error::Config(format!("invalid manifest pattern `{}`: {e}", entry.pattern))
        })?;

        let mut count = 0usize;
        for found in matches {
            let path = found.map_err(|e| Error::ResourceStagingFailed {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if exclude.iter().any(|dir| path.starts_with(dir)) {
                log::debug!("Not staging {} (pipeline output)", path.display());
                continue;
            }

            let target = dest_dir.join(relative_to_base(&path, &base));
            for file in copy_match(&path, &target).await? {
                let artifact = Artifact::from_path(&file, stage).await?;
                staged.retain(|a| a.path != artifact.path);
                staged.push(artifact);
            }
            count += 1;
        }

        if count == 0 {
            log::info!("Pattern `{}` matched nothing, skipping", entry.pattern);
        } else {
            log::debug!("Pattern `{}` -> {destination}: {count} match(es)", entry.pattern);
        }
    }
    Ok(staged)
}

/// Copies one match, mapping copy failures to the source path.
async fn copy_match(source: &Path, target: &Path) -> Result<Vec<PathBuf>> {
    let meta = tokio::fs::metadata(source)
        .await
        .map_err(|e| Error::ResourceStagingFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

    let copied = if meta.is_dir() {
        fs::copy_dir(source, target).await
    } else {
        fs::copy_file(source, target).await.map(|_| vec![target.to_path_buf()])
    };

    copied.map_err(|e| match e {
        Error::FilesystemError { source: io, .. } => Error::ResourceStagingFailed {
            path: source.to_path_buf(),
            source: io,
        },
        other => other,
    })
}

/// Leading components of `pattern` that contain no glob syntax. A pattern
/// without any glob syntax yields its parent.
fn literal_prefix(pattern: &str) -> PathBuf {
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    let first_glob = components
        .iter()
        .position(|c| c.as_os_str().to_string_lossy().contains(['*', '?', '[']))
        .unwrap_or(components.len().saturating_sub(1));
    components[..first_glob].iter().collect()
}

fn relative_to_base(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
        _ => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use walkdir::WalkDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn files_under(root: &Path) -> BTreeSet<String> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn literal_prefix_stops_at_first_glob() {
        assert_eq!(literal_prefix("*.html"), PathBuf::new());
        assert_eq!(literal_prefix("icons/*.png"), PathBuf::from("icons"));
        assert_eq!(literal_prefix("static/**/*.js"), PathBuf::from("static"));
        assert_eq!(literal_prefix("docs/README.md"), PathBuf::from("docs"));
    }

    #[tokio::test]
    async fn html_and_icons_land_at_mapped_destinations() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(src.path(), "a.html", "<html></html>");
        write(src.path(), "icons/x.png", "png");
        write(src.path(), "main.py", "print()");
        write(src.path(), "icons/notes.txt", "n");

        let manifest = Manifest::new([("*.html", "."), ("icons/*.png", "icons/")]);
        let staging = out.path().join("staging");
        let staged = stage(&manifest, src.path(), &staging, &[], "stage-resources")
            .await
            .unwrap();

        assert_eq!(
            files_under(&staging),
            BTreeSet::from(["a.html".to_string(), "icons/x.png".to_string()])
        );
        assert_eq!(staged.len(), 2);
        assert!(staged.iter().all(|a| a.stage == "stage-resources"));
    }

    #[tokio::test]
    async fn every_match_is_staged_and_nothing_else() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        for rel in [
            "index.html",
            "style.css",
            "app.js",
            "static/js/vendor/lib.js",
            "static/js/main.js",
            "static/readme.md",
            "tests/test_ui.py",
        ] {
            write(src.path(), rel, rel);
        }

        let manifest = Manifest::new([
            ("*.html", "."),
            ("*.css", "."),
            ("static/**/*.js", "static"),
        ]);
        let staging = out.path().join("staging");
        stage(&manifest, src.path(), &staging, &[], "stage-resources")
            .await
            .unwrap();

        assert_eq!(
            files_under(&staging),
            BTreeSet::from([
                "index.html".to_string(),
                "style.css".to_string(),
                "static/js/main.js".to_string(),
                "static/js/vendor/lib.js".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn zero_matches_still_creates_destination() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manifest = Manifest::new([("icons/*.png", "icons/")]);
        let staging = out.path().join("staging");

        let staged = stage(&manifest, src.path(), &staging, &[], "stage-resources")
            .await
            .unwrap();
        assert!(staged.is_empty());
        assert!(staging.join("icons").is_dir());
    }

    #[tokio::test]
    async fn directories_merge_on_rerun() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(src.path(), "web/site/index.html", "v1");
        write(src.path(), "web/site/img/logo.png", "logo");

        let manifest = Manifest::new([("web/*", "web")]);
        let staging = out.path().join("staging");
        write(&staging, "web/site/stale.txt", "old");

        stage(&manifest, src.path(), &staging, &[], "s").await.unwrap();
        write(src.path(), "web/site/index.html", "v2");
        stage(&manifest, src.path(), &staging, &[], "s").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(staging.join("web/site/index.html")).unwrap(),
            "v2"
        );
        assert!(staging.join("web/site/img/logo.png").is_file());
        assert!(staging.join("web/site/stale.txt").is_file());
    }

    #[tokio::test]
    async fn pipeline_output_is_excluded() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "page.html", "p");
        write(src.path(), "build/portable/staging/page.html", "stale");

        let manifest = Manifest::new([("**/*.html", ".")]);
        let staging = src.path().join("build/portable/staging");
        let build = src.path().join("build");
        let staged = stage(&manifest, src.path(), &staging, &[build.as_path()], "s")
            .await
            .unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(std::fs::read_to_string(staging.join("page.html")).unwrap(), "p");
    }
}
