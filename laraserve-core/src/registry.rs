//! Site registry persistence.
//!
//! # Storage layout
//!
//! ```text
//! <home>/.laraserve/         (mode 0700, created on first save)
//!   sites.yaml               (registry document, mode 0600)
//!   config.yaml              (optional settings, see `settings`)
//!   templates/               (optional template overrides)
//! ```
//!
//! # API pattern
//!
//! Persisting functions take an explicit `home` (`_at` suffix). The CLI passes
//! [`Identity::home`](crate::identity::Identity), tests pass a `TempDir`.
//! [`upsert`], [`remove`] and [`find`] are pure and never touch the disk.

use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::types::{RegistryFile, SiteRecord};

pub const STATE_DIR: &str = ".laraserve";
pub const REGISTRY_FILE: &str = "sites.yaml";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.laraserve/`: pure, no I/O.
pub fn state_dir_at(home: &Path) -> PathBuf {
    home.join(STATE_DIR)
}

/// `<home>/.laraserve/sites.yaml`: pure, no I/O.
pub fn registry_path_at(home: &Path) -> PathBuf {
    state_dir_at(home).join(REGISTRY_FILE)
}

/// Creates `<home>/.laraserve/` (mode `0700`) if it does not yet exist.
///
/// The directory is handed to the owner of `home`, so a registry first
/// written under `sudo` stays readable by the user it belongs to.
pub fn ensure_state_dir_at(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = state_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    match_home_owner(home, &dir)?;
    Ok(dir)
}

/// Reads `path`, mapping only a missing file to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, RegistryError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RegistryError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load every site record in insertion order.
///
/// Returns an empty list only if the registry file does not exist yet.
/// Any other read failure is `RegistryError::Unreadable`, and a malformed
/// document is `RegistryError::Corrupt` (with path + line context).
pub fn load_at(home: &Path) -> Result<Vec<SiteRecord>, RegistryError> {
    let path = registry_path_at(home);
    let Some(contents) = read_optional(&path)? else {
        return Ok(vec![]);
    };
    let doc: RegistryFile = serde_yaml::from_str(&contents)
        .map_err(|e| RegistryError::Corrupt { path, source: e })?;
    Ok(doc.sites)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically replace the registry with `records`.
///
/// Write flow: serialize → `sites.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// The `.tmp` file lives in the same directory as the target so the rename
/// never crosses filesystems.
pub fn save_at(home: &Path, records: &[SiteRecord]) -> Result<(), RegistryError> {
    ensure_state_dir_at(home)?;
    let path = registry_path_at(home);
    let tmp_path = path.with_file_name(format!("{REGISTRY_FILE}.tmp"));

    let yaml = serde_yaml::to_string(&RegistryFile::new(records.to_vec()))?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = match_home_owner(home, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Pure mutations
// ---------------------------------------------------------------------------

/// Returns `records` with `record` replacing the entry sharing its domain
/// (keeping that entry's position), or appended if the domain is new.
pub fn upsert(records: &[SiteRecord], record: SiteRecord) -> Vec<SiteRecord> {
    let mut out = records.to_vec();
    match out.iter_mut().find(|r| r.domain == record.domain) {
        Some(existing) => *existing = record,
        None => out.push(record),
    }
    out
}

/// Returns `records` without the entry for `domain`, plus the removed entry.
///
/// When `domain` is not registered the sequence comes back unchanged.
pub fn remove(records: &[SiteRecord], domain: &str) -> (Vec<SiteRecord>, Option<SiteRecord>) {
    let mut removed = None;
    let kept: Vec<SiteRecord> = records
        .iter()
        .filter(|r| {
            if removed.is_none() && r.domain == domain {
                removed = Some((*r).clone());
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();
    (kept, removed)
}

/// Looks up the record for `domain`.
pub fn find<'a>(records: &'a [SiteRecord], domain: &str) -> Option<&'a SiteRecord> {
    records.iter().find(|r| r.domain == domain)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

/// Chowns `path` to the owner of `home` when they differ. Only root gets here
/// in practice: everyone else creates files they already own. A missing home
/// leaves ownership alone.
#[cfg(unix)]
fn match_home_owner(home: &Path, path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::MetadataExt;
    let Ok(owner) = std::fs::metadata(home) else {
        return Ok(());
    };
    let current = std::fs::metadata(path)?;
    if current.uid() == owner.uid() && current.gid() == owner.gid() {
        return Ok(());
    }
    std::os::unix::fs::chown(path, Some(owner.uid()), Some(owner.gid()))?;
    Ok(())
}
#[cfg(not(unix))]
fn match_home_owner(_home: &Path, _path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
