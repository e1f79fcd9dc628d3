//! Capability seams between the orchestrator and the machine it mutates.
//!
//! The orchestrator only ever talks to these traits. Production wiring lives
//! in [`crate::platform`]; tests substitute recording fakes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use laraserve_core::types::{BackendId, CertPaths};

use crate::error::StepError;

/// Address every provisioned domain resolves to.
pub const LOOPBACK_IP: &str = "127.0.0.1";

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

/// Result of an idempotent hosts-file edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostsOutcome {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

impl HostsOutcome {
    /// `true` when the hosts file was rewritten.
    pub fn changed(&self) -> bool {
        matches!(self, HostsOutcome::Added | HostsOutcome::Removed)
    }
}

pub trait HostsEditor {
    /// Map `domain` to `ip`. An existing loopback entry is `AlreadyPresent`.
    fn add_entry(&self, domain: &str, ip: &str) -> Result<HostsOutcome, StepError>;

    /// Drop the loopback entries for `domain`. A missing entry is `NotPresent`.
    fn remove_entry(&self, domain: &str) -> Result<HostsOutcome, StepError>;
}

// ---------------------------------------------------------------------------
// TLS and permissions
// ---------------------------------------------------------------------------

pub trait CertIssuer {
    /// Issue (or re-issue) a locally trusted certificate for `domain`.
    fn setup_ssl(&self, domain: &str) -> Result<CertPaths, StepError>;
}

pub trait PermissionFixer {
    /// Make `path` writable by its owner and readable by `backend`'s run-time user.
    fn fix_permissions(&self, path: &Path, backend: BackendId) -> Result<(), StepError>;
}

// ---------------------------------------------------------------------------
// Web servers
// ---------------------------------------------------------------------------

/// Everything a configurator needs to enable one site.
#[derive(Debug, Clone, Copy)]
pub struct EnableRequest<'a> {
    pub domain: &'a str,
    pub document_root: &'a Path,
    pub tls: Option<&'a CertPaths>,
}

pub trait ServerConfigurator {
    fn backend(&self) -> BackendId;

    fn is_installed(&self) -> bool;

    /// Write the site's config, enable it and reload the server.
    fn enable_site(&self, request: &EnableRequest<'_>) -> Result<(), StepError>;

    /// Disable the site, delete its config and reload the server.
    fn disable_site(&self, domain: &str) -> Result<(), StepError>;
}

/// Lookup table from backend to its configurator.
#[derive(Default)]
pub struct BackendTable {
    configurators: BTreeMap<BackendId, Box<dyn ServerConfigurator>>,
}

impl BackendTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `configurator` under its own [`ServerConfigurator::backend`],
    /// replacing any previous entry.
    pub fn with(mut self, configurator: Box<dyn ServerConfigurator>) -> Self {
        self.configurators
            .insert(configurator.backend(), configurator);
        self
    }

    pub fn get(&self, backend: BackendId) -> Option<&dyn ServerConfigurator> {
        self.configurators.get(&backend).map(|c| c.as_ref())
    }

    /// Backends whose configurator reports the server as installed.
    pub fn detect_installed(&self) -> BTreeSet<BackendId> {
        self.configurators
            .iter()
            .filter(|(_, c)| c.is_installed())
            .map(|(backend, _)| *backend)
            .collect()
    }
}

/// The full set of providers one orchestrator run uses.
pub struct Capabilities {
    pub hosts: Box<dyn HostsEditor>,
    pub certs: Box<dyn CertIssuer>,
    pub permissions: Box<dyn PermissionFixer>,
    pub servers: BackendTable,
}
