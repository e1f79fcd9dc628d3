//! Atomic file replacement for rendered server configuration and the hosts file.
//!
//! ## `atomic_write` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. Compare with the current file content → skip if identical.
//! 3. Write to the temp sibling.
//! 4. Copy the target's permissions onto the temp file (if the target exists).
//! 5. Rename to final path (atomic on POSIX).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{io_err, StepError};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; its content already matches.
    Unchanged { path: PathBuf },
}

/// Replace `path` with `content` via a `<path>.laraserve.tmp` sibling.
pub fn atomic_write(path: &Path, content: &str) -> Result<WriteResult, StepError> {
    let tmp = PathBuf::from(format!("{}.laraserve.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

/// Like [`atomic_write`] with an explicit temp file. `tmp` must be on the
/// same filesystem as `path`.
pub fn atomic_write_with_tmp(
    path: &Path,
    content: &str,
    tmp: &Path,
) -> Result<WriteResult, StepError> {
    let normalized = content.replace("\r\n", "\n");

    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(io_err(path, e)),
    };

    if existing.is_some() {
        let current = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if current == normalized {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(tmp, &normalized).map_err(|e| io_err(tmp, e))?;

    if let Some(meta) = existing {
        if let Err(e) = fs::set_permissions(tmp, meta.permissions()) {
            let _ = fs::remove_file(tmp);
            return Err(io_err(tmp, e));
        }
    }

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Delete `path`; a missing file is not an error. Returns whether it existed.
pub fn remove_if_exists(path: &Path) -> Result<bool, StepError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("removed: {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shop.test.conf");
        let result = atomic_write(&path, "hello").unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn second_write_same_content_returns_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shop.test");
        atomic_write(&path, "same content").unwrap();
        let result = atomic_write(&path, "same content").unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shop.test");
        atomic_write(&path, "v1").unwrap();
        let result = atomic_write(&path, "v2").unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    }

    #[test]
    fn crlf_is_normalised_before_compare() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shop.test");
        atomic_write(&path, "a\nb\n").unwrap();
        let result = atomic_write(&path, "a\r\nb\r\n").unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sites-available").join("shop.test");
        atomic_write(&path, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn no_tmp_left_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shop.test");
        atomic_write(&path, "x").unwrap();
        assert!(!tmp.path().join("shop.test.laraserve.tmp").exists());
    }

    #[test]
    fn directory_target_fails_without_tmp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();
        let tmp_file = tmp.path().join("occupied.tmp");

        let err = atomic_write_with_tmp(&path, "content", &tmp_file);
        assert!(err.is_err());
        assert!(!tmp_file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn existing_mode_is_preserved() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hosts");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        atomic_write(&path, "new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone");
        fs::write(&path, "x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
