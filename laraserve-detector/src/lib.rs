//! Tool-chain detection for `laraserve-detector`.
//!
//! - [`Probe`] answers "is this web server installed?" by checking well-known
//!   binary locations first and the `PATH` second.
//! - [`php_version`] asks the local `php` binary for its `major.minor`.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use laraserve_core::types::BackendId;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },
}

// ---------------------------------------------------------------------------
// Backend probing
// ---------------------------------------------------------------------------

const APACHE_BINARIES: &[&str] = &[
    "/usr/sbin/apache2",
    "/usr/sbin/httpd",
    "/usr/local/apache2/bin/apachectl",
    "/usr/local/bin/apachectl",
];

const NGINX_BINARIES: &[&str] = &[
    "/usr/sbin/nginx",
    "/usr/local/sbin/nginx",
    "/usr/local/bin/nginx",
];

/// Well-known absolute binary locations for `backend`.
pub fn known_binaries(backend: BackendId) -> &'static [&'static str] {
    match backend {
        BackendId::Apache => APACHE_BINARIES,
        BackendId::Nginx => NGINX_BINARIES,
    }
}

/// Program name searched on `PATH` when no well-known location exists.
pub fn path_program(backend: BackendId) -> &'static str {
    match backend {
        BackendId::Apache => "apache2",
        BackendId::Nginx => "nginx",
    }
}

/// Installation probe.
///
/// `root` prefixes every well-known absolute location (`/` on a real system,
/// a `TempDir` in tests); `path_var` is the `PATH` to search.
#[derive(Debug, Clone)]
pub struct Probe {
    root: PathBuf,
    path_var: Option<OsString>,
}

impl Probe {
    /// Probe the running system.
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/"),
            path_var: std::env::var_os("PATH"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>, path_var: Option<OsString>) -> Self {
        Self {
            root: root.into(),
            path_var,
        }
    }

    /// `true` if any well-known binary exists or the backend's program is on `PATH`.
    pub fn is_installed(&self, backend: BackendId) -> bool {
        let known = known_binaries(backend).iter().any(|abs| {
            let rel = abs.trim_start_matches('/');
            self.root.join(rel).exists()
        });
        if known {
            tracing::debug!(%backend, "found at a well-known location");
            return true;
        }
        self.find_program(path_program(backend)).is_some()
    }

    /// All installed backends.
    pub fn detect_installed(&self) -> BTreeSet<BackendId> {
        BackendId::all()
            .iter()
            .copied()
            .filter(|b| self.is_installed(*b))
            .collect()
    }

    /// Locate an executable named `program` on this probe's `PATH`.
    pub fn find_program(&self, program: &str) -> Option<PathBuf> {
        find_program_in(program, self.path_var.as_deref())
    }
}

/// Pick the backend to use when the caller did not name one.
///
/// Follows [`BackendId::PREFERENCE`]: nginx wins when both are installed.
pub fn preferred_backend(installed: &BTreeSet<BackendId>) -> Option<BackendId> {
    BackendId::PREFERENCE
        .iter()
        .copied()
        .find(|b| installed.contains(b))
}

/// Locate an executable named `program` in the directories of `path_var`.
pub fn find_program_in(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// PHP
// ---------------------------------------------------------------------------

const PHP_VERSION_SNIPPET: &str = "echo PHP_MAJOR_VERSION.\".\".PHP_MINOR_VERSION;";

/// Installed PHP `major.minor`, or `None` if `php` is missing or misbehaves.
pub fn php_version() -> Result<Option<String>, DetectError> {
    let output = match Command::new("php").args(["-r", PHP_VERSION_SNIPPET]).output() {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !output.status.success() {
        tracing::debug!(status = %output.status, "php exited unsuccessfully");
        return Ok(None);
    }
    Ok(parse_php_version(&String::from_utf8_lossy(&output.stdout)))
}

/// Accepts `"8.3"` (surrounding whitespace allowed); rejects anything else.
pub fn parse_php_version(stdout: &str) -> Option<String> {
    let trimmed = stdout.trim();
    let (major, minor) = trimmed.split_once('.')?;
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if numeric(major) && numeric(minor) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// `<socket_dir>/php<version>-fpm.sock`
pub fn php_fpm_socket(socket_dir: &Path, version: &str) -> PathBuf {
    socket_dir.join(format!("php{version}-fpm.sock"))
}
