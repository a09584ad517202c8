//! Build output discovery

use std::path::{Path, PathBuf};

use tokio::fs;

use skiff_platform::errors::PlatformError;

/// One file discovered in the build output tree
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Path relative to the output root
    pub relative: PathBuf,
}

/// Recursively collect every regular file under the output root.
/// Directories are traversed; anything else is skipped.
pub async fn collect_artifacts(root: &Path) -> Result<Vec<Artifact>, PlatformError> {
    let mut artifacts = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|e| {
                        PlatformError::BuildError(format!("Output path escapes root: {}", e))
                    })?
                    .to_path_buf();
                artifacts.push(Artifact { path, relative });
            }
        }
    }

    // Deterministic upload order, independent of directory iteration order
    artifacts.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn test_collects_nested_files_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<html></html>").await;
        write(dir.path(), "assets/app.js", "console.log(1)").await;
        write(dir.path(), "assets/css/site.css", "body{}").await;

        let artifacts = collect_artifacts(dir.path()).await.unwrap();
        let relatives: Vec<String> = artifacts
            .iter()
            .map(|a| a.relative.display().to_string())
            .collect();

        assert_eq!(relatives, vec!["assets/app.js", "assets/css/site.css", "index.html"]);
    }

    #[tokio::test]
    async fn test_empty_tree_yields_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty/deeper")).await.unwrap();

        let artifacts = collect_artifacts(dir.path()).await.unwrap();
        assert!(artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(collect_artifacts(&missing).await.is_err());
    }
}
