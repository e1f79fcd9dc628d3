//! Provisioning and teardown of one site.
//!
//! ## `provision` order
//!
//! 0. Validate the intent (no side effects).
//! 1. Resolve the backend.
//! 2. Fix document root permissions (warn).
//! 3. Issue a TLS certificate if requested (fatal).
//! 4. Enable the site on the backend (fatal).
//! 5. Add the loopback hosts entry (fatal).
//! 6. Upsert and save the registry record.
//!
//! The registry is written last, so a failed request never leaves a record
//! behind. Side effects already applied by earlier steps are not rolled back.

use std::path::{Path, PathBuf};

use serde::Serialize;

use laraserve_core::registry;
use laraserve_core::types::{BackendId, CertPaths, SiteIntent, SiteRecord};
use laraserve_detector::preferred_backend;

use crate::capability::{Capabilities, EnableRequest, HostsOutcome, LOOPBACK_IP};
use crate::error::{ProvisionError, StepError};
use crate::step::{Step, StepRunner, StepWarning};
use crate::validate::{normalize_domain, resolve_document_root};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub record: SiteRecord,
    pub warnings: Vec<StepWarning>,
    pub certificate: Option<CertPaths>,
    pub hosts: Option<HostsOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeprovisionReport {
    /// The removed record. Its `path` was left on disk.
    pub record: SiteRecord,
    pub warnings: Vec<StepWarning>,
    pub hosts: Option<HostsOutcome>,
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

/// Applies intents against the registry under `home` using `caps`.
pub struct Provisioner<'a> {
    home: PathBuf,
    caps: &'a Capabilities,
}

impl<'a> Provisioner<'a> {
    pub fn new(home: impl Into<PathBuf>, caps: &'a Capabilities) -> Self {
        Self {
            home: home.into(),
            caps,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Bring the machine in line with `intent` and record the site.
    ///
    /// Re-running with the same intent is safe; the record is replaced in place.
    pub fn provision(&self, intent: &SiteIntent) -> Result<ProvisionReport, ProvisionError> {
        let domain = normalize_domain(&intent.domain)?;
        let document_root = resolve_document_root(&intent.path)?;
        let records = registry::load_at(&self.home)?;
        let existing = registry::find(&records, &domain);

        let backend = match (intent.server, existing) {
            (Some(requested), Some(rec)) if requested != rec.server => {
                return Err(ProvisionError::Validation(format!(
                    "{domain} is already served by {}; remove it before switching to {requested}",
                    rec.server
                )));
            }
            (Some(requested), _) => requested,
            (None, Some(rec)) => rec.server,
            (None, None) => self.detect_backend()?,
        };
        tracing::info!(%domain, %backend, root = %document_root.display(), "provisioning site");

        let configurator = self.caps.servers.get(backend).ok_or_else(|| {
            ProvisionError::ServerConfigFailed {
                backend,
                source: StepError::Failed(format!("no configurator available for {backend}")),
            }
        })?;

        let mut steps = StepRunner::new(backend);

        steps.run_step(Step::Permissions, || {
            self.caps.permissions.fix_permissions(&document_root, backend)
        })?;

        let certificate = if intent.ssl {
            steps.run_step(Step::Certificate, || self.caps.certs.setup_ssl(&domain))?
        } else {
            None
        };

        let request = EnableRequest {
            domain: &domain,
            document_root: &document_root,
            tls: certificate.as_ref(),
        };
        steps.run_step(Step::ServerConfig, || configurator.enable_site(&request))?;

        let hosts = steps.run_step(Step::HostsEntry, || {
            self.caps.hosts.add_entry(&domain, LOOPBACK_IP)
        })?;

        let record = SiteRecord {
            domain: domain.clone(),
            path: document_root,
            server: backend,
            ssl: certificate.is_some(),
        };
        let updated = registry::upsert(&records, record.clone());
        registry::save_at(&self.home, &updated)?;
        tracing::info!(%domain, "site registered");

        Ok(ProvisionReport {
            record,
            warnings: steps.into_warnings(),
            certificate,
            hosts,
        })
    }

    /// Tear down `domain` and drop its record.
    ///
    /// Only an unknown domain or a failed registry save fails; every teardown
    /// step is best-effort. The document root is never touched.
    pub fn deprovision(&self, domain: &str) -> Result<DeprovisionReport, ProvisionError> {
        let key = domain.trim().to_ascii_lowercase();
        let records = registry::load_at(&self.home)?;
        let (remaining, removed) = registry::remove(&records, &key);
        let record = removed.ok_or_else(|| ProvisionError::SiteNotFound {
            domain: domain.to_string(),
        })?;
        tracing::info!(domain = %record.domain, backend = %record.server, "removing site");

        let mut steps = StepRunner::new(record.server);

        match self.caps.servers.get(record.server) {
            Some(configurator) => {
                steps.run_step(Step::DisableSite, || configurator.disable_site(&record.domain))?;
            }
            None => steps.warn(
                Step::DisableSite,
                format!("no configurator available for {}", record.server),
            ),
        }

        let hosts = steps.run_step(Step::RemoveHostsEntry, || {
            self.caps.hosts.remove_entry(&record.domain)
        })?;

        registry::save_at(&self.home, &remaining)?;
        tracing::info!(domain = %record.domain, "site unregistered");

        Ok(DeprovisionReport {
            record,
            warnings: steps.into_warnings(),
            hosts,
        })
    }

    fn detect_backend(&self) -> Result<BackendId, ProvisionError> {
        let installed = self.caps.servers.detect_installed();
        tracing::debug!(?installed, "detected backends");
        preferred_backend(&installed).ok_or(ProvisionError::NoServerDetected)
    }
}
