//! All-or-nothing file writes
//!
//! Content goes to a uniquely named temp file next to the target, is synced,
//! then renamed over the target. On failure the temp file is removed and the
//! target keeps its previous content.

use crate::error::{SchemaError, SchemaResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Atomically replace `path` with `content`
///
/// # Errors
/// Returns `SchemaError::PartialWriteError` if any step fails
pub fn write_atomic(path: impl AsRef<Path>, content: &[u8]) -> SchemaResult<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Err(e) = write_then_rename(&temp_path, path, content) {
        // The temp file may not exist if creation itself failed.
        let _ = fs::remove_file(&temp_path);
        return Err(SchemaError::partial_write(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "persisted file");
    Ok(())
}

fn write_then_rename(temp_path: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = path
        .file_name()
        .map_or_else(|| "output".into(), |name| name.to_string_lossy());
    parent.join(format!(".{stem}.tmp_{}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sand_config.yaml");

        write_atomic(&path, b"YEAR:\n  type: set\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "YEAR:\n  type: set\n");
        assert_eq!(entries(dir.path()), vec!["sand_config.yaml"]);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sand_config.yaml");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join("sand_config.yaml");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "kept").unwrap();

        let err = write_atomic(&target, b"new").unwrap_err();

        assert!(matches!(err, SchemaError::PartialWriteError { .. }));
        assert_eq!(entries(dir.path()), vec!["sand_config.yaml"]);
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "kept");
    }

    #[test]
    fn missing_parent_is_partial_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("sand_config.yaml");

        let err = write_atomic(&path, b"new").unwrap_err();

        assert!(matches!(err, SchemaError::PartialWriteError { .. }));
        assert!(!path.exists());
    }
}
