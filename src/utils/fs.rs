//! File system helpers
//!
//! The output manifest is written with [`atomic_write`], so a crash or a fatal
//! error never leaves a truncated `.DEPS.git` behind.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Creates `path` and its parents if they do not exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Writes `content` to a sibling temp file, syncs it and renames it over
/// `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }

    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// True when `path` is a directory with no entries.
pub async fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;
    Ok(entries.next_entry().await?.is_none())
}

/// Removes a file or directory tree if it exists.
pub async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to stat {}", path.display()));
        }
    };
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    removed.with_context(|| format!("Failed to remove {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents_and_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested").join(".DEPS.git");

        atomic_write(&target, b"deps = {}\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "deps = {}\n");
        assert!(!temp.path().join("nested").join(".DEPS.git.tmp").exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        fs::write(&target, "old").unwrap();

        atomic_write(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_is_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(is_empty_dir(temp.path()).await.unwrap());
        fs::write(temp.path().join("f"), "x").unwrap();
        assert!(!is_empty_dir(temp.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_path_handles_missing_files_and_dirs() {
        let temp = TempDir::new().unwrap();
        remove_path(&temp.path().join("missing")).await.unwrap();

        let dir = temp.path().join("stale");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub").join("f"), "x").unwrap();
        remove_path(&dir).await.unwrap();
        assert!(!dir.exists());

        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        remove_path(&file).await.unwrap();
        assert!(!file.exists());
    }
}
