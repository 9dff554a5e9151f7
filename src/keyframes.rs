//! Offline keyframes extraction over a directory of stylesheets.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

/// Reads every `*.css` file directly inside `dir`, sorted by file name.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the file.
pub async fn read_css_dir(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry.path();
        let is_css = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("css"))
            .unwrap_or(false);
        if is_css && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let css = String::from_utf8_lossy(&bytes).into_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(file = %name, bytes = css.len(), "loaded stylesheet");
        sources.push((name, css));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_only_css_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.css"), ".b {}").unwrap();
        std::fs::write(dir.path().join("a.CSS"), ".a {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        std::fs::create_dir(dir.path().join("nested.css")).unwrap();

        let sources = read_css_dir(dir.path()).await.unwrap();
        let names: Vec<_> = sources.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.CSS", "b.css"]);
        assert_eq!(sources[1].1, ".b {}");
    }

    #[tokio::test]
    async fn non_utf8_stylesheets_are_still_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("legacy.css"),
            b"/* caf\xe9 */ @keyframes spin { to { opacity: 1 } }".as_slice(),
        )
        .unwrap();

        let sources = read_css_dir(dir.path()).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].1.contains("@keyframes spin { to { opacity: 1 } }"));
        let blocks = perceiver_design::motion::extract_keyframes_from_css(&sources, 10);
        assert_eq!(blocks[0].name, "spin");
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_css_dir(&dir.path().join("absent")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to list"));
    }
}
