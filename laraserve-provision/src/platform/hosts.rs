//! `/etc/hosts` editing.
//!
//! A domain counts as present when a line reads exactly `<ip> <domain>` for a
//! loopback address (any amount of whitespace between, trailing whitespace
//! allowed). Lines that alias several names are left alone. Every rewrite
//! first copies the current file to `<hosts>.backup.<unix-millis>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::capability::{HostsEditor, HostsOutcome};
use crate::error::{io_err, StepError};
use crate::writer::atomic_write_with_tmp;

const LOOPBACK_ADDRS: &[&str] = &["127.0.0.1", "::1"];
const TMP_NAME: &str = ".hosts.tmp";

#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, StepError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(io_err(&self.path, e)),
        }
    }

    fn write(&self, content: &str) -> Result<(), StepError> {
        if self.path.exists() {
            let backup = PathBuf::from(format!(
                "{}.backup.{}",
                self.path.display(),
                Utc::now().timestamp_millis()
            ));
            fs::copy(&self.path, &backup).map_err(|e| io_err(&backup, e))?;
            tracing::debug!(backup = %backup.display(), "hosts file backed up");
        }
        let tmp = self
            .path
            .parent()
            .map(|dir| dir.join(TMP_NAME))
            .unwrap_or_else(|| PathBuf::from(TMP_NAME));
        atomic_write_with_tmp(&self.path, content, &tmp)?;
        Ok(())
    }
}

impl HostsEditor for HostsFile {
    fn add_entry(&self, domain: &str, ip: &str) -> Result<HostsOutcome, StepError> {
        let content = self.read()?;
        if has_entry(&content, domain, ip) {
            tracing::debug!(%domain, "hosts entry already present");
            return Ok(HostsOutcome::AlreadyPresent);
        }
        self.write(&with_entry(&content, domain, ip))?;
        tracing::info!(%domain, %ip, hosts = %self.path.display(), "hosts entry added");
        Ok(HostsOutcome::Added)
    }

    fn remove_entry(&self, domain: &str) -> Result<HostsOutcome, StepError> {
        let content = self.read()?;
        let Some(updated) = without_entry(&content, domain) else {
            tracing::debug!(%domain, "no hosts entry to remove");
            return Ok(HostsOutcome::NotPresent);
        };
        self.write(&updated)?;
        tracing::info!(%domain, hosts = %self.path.display(), "hosts entry removed");
        Ok(HostsOutcome::Removed)
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn entry_addr<'a>(line: &'a str, domain: &str) -> Option<&'a str> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(addr), Some(name), None) if name == domain => Some(addr),
        _ => None,
    }
}

/// `true` if `content` maps `domain` to a loopback address or to `ip`.
pub fn has_entry(content: &str, domain: &str, ip: &str) -> bool {
    content.lines().any(|line| {
        entry_addr(line, domain).is_some_and(|addr| addr == ip || LOOPBACK_ADDRS.contains(&addr))
    })
}

/// `content` with `<ip> <domain>` appended on its own line.
pub fn with_entry(content: &str, domain: &str, ip: &str) -> String {
    let trimmed = content.trim_end();
    if trimmed.is_empty() {
        format!("{ip} {domain}\n")
    } else {
        format!("{trimmed}\n{ip} {domain}\n")
    }
}

/// `content` without the first IPv4 and first IPv6 loopback line for
/// `domain`, or `None` when neither exists.
pub fn without_entry(content: &str, domain: &str) -> Option<String> {
    let mut dropped_v4 = false;
    let mut dropped_v6 = false;
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| match entry_addr(line, domain) {
            Some("127.0.0.1") if !dropped_v4 => {
                dropped_v4 = true;
                false
            }
            Some("::1") if !dropped_v6 => {
                dropped_v6 = true;
                false
            }
            _ => true,
        })
        .collect();

    if !(dropped_v4 || dropped_v6) {
        return None;
    }
    let joined = kept.join("\n");
    let trimmed = joined.trim_end();
    Some(if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    })
}
