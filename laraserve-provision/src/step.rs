//! Per-step failure policy and the single helper that applies it.
//!
//! | Step               | Policy         | Error category            |
//! |--------------------|----------------|---------------------------|
//! | `Permissions`      | `WarnOnError`  | `PermissionsFailed`       |
//! | `Certificate`      | `FatalOnError` | `CertificateSetupFailed`  |
//! | `ServerConfig`     | `FatalOnError` | `ServerConfigFailed`      |
//! | `HostsEntry`       | `FatalOnError` | `HostsUpdateFailed`       |
//! | `DisableSite`      | `WarnOnError`  | `ServerConfigFailed`      |
//! | `RemoveHostsEntry` | `WarnOnError`  | `HostsUpdateFailed`       |

use std::fmt;

use serde::Serialize;

use laraserve_core::types::BackendId;

use crate::error::{ProvisionError, StepError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Abort the request with the step's error category.
    FatalOnError,
    /// Log, record a [`StepWarning`] and continue.
    WarnOnError,
}

/// A side-effecting step of provisioning or teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Permissions,
    Certificate,
    ServerConfig,
    HostsEntry,
    DisableSite,
    RemoveHostsEntry,
}

impl Step {
    pub const fn policy(self) -> StepPolicy {
        match self {
            Step::Certificate | Step::ServerConfig | Step::HostsEntry => StepPolicy::FatalOnError,
            Step::Permissions | Step::DisableSite | Step::RemoveHostsEntry => {
                StepPolicy::WarnOnError
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Permissions => "permissions",
            Step::Certificate => "certificate",
            Step::ServerConfig => "server config",
            Step::HostsEntry => "hosts entry",
            Step::DisableSite => "disable site",
            Step::RemoveHostsEntry => "remove hosts entry",
        }
    }

    fn into_error(self, backend: BackendId, source: StepError) -> ProvisionError {
        match self {
            Step::Permissions => ProvisionError::PermissionsFailed(source),
            Step::Certificate => ProvisionError::CertificateSetupFailed(source),
            Step::ServerConfig | Step::DisableSite => {
                ProvisionError::ServerConfigFailed { backend, source }
            }
            Step::HostsEntry | Step::RemoveHostsEntry => ProvisionError::HostsUpdateFailed(source),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A best-effort step that failed without aborting the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepWarning {
    pub step: Step,
    pub message: String,
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Runs steps for one site and collects the warnings they produce.
#[derive(Debug)]
pub(crate) struct StepRunner {
    backend: BackendId,
    warnings: Vec<StepWarning>,
}

impl StepRunner {
    pub(crate) fn new(backend: BackendId) -> Self {
        Self {
            backend,
            warnings: Vec::new(),
        }
    }

    /// Run `op` under `step`'s policy.
    ///
    /// Returns `Ok(Some(value))` on success and `Ok(None)` when a
    /// `WarnOnError` step failed (the failure is kept as a warning).
    pub(crate) fn run_step<T>(
        &mut self,
        step: Step,
        op: impl FnOnce() -> Result<T, StepError>,
    ) -> Result<Option<T>, ProvisionError> {
        tracing::debug!(%step, backend = %self.backend, "running step");
        match op() {
            Ok(value) => Ok(Some(value)),
            Err(err) => match step.policy() {
                StepPolicy::FatalOnError => {
                    tracing::debug!(%step, error = %err, "step failed, aborting");
                    Err(step.into_error(self.backend, err))
                }
                StepPolicy::WarnOnError => {
                    tracing::warn!(%step, error = %err, "step failed, continuing");
                    self.warn(step, err.to_string());
                    Ok(None)
                }
            },
        }
    }

    pub(crate) fn warn(&mut self, step: Step, message: impl Into<String>) {
        self.warnings.push(StepWarning {
            step,
            message: message.into(),
        });
    }

    pub(crate) fn into_warnings(self) -> Vec<StepWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_value_and_no_warning() {
        let mut runner = StepRunner::new(BackendId::Nginx);
        let out = runner.run_step(Step::HostsEntry, || Ok(7)).unwrap();
        assert_eq!(out, Some(7));
        assert!(runner.into_warnings().is_empty());
    }

    #[test]
    fn warn_policy_records_warning_and_continues() {
        let mut runner = StepRunner::new(BackendId::Nginx);
        let out: Option<()> = runner
            .run_step(Step::Permissions, || Err(StepError::Failed("chown refused".into())))
            .unwrap();
        assert!(out.is_none());
        let warnings = runner.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].step, Step::Permissions);
        assert_eq!(warnings[0].message, "chown refused");
    }

    #[test]
    fn fatal_policy_maps_to_step_category() {
        let mut runner = StepRunner::new(BackendId::Apache);
        let err = runner
            .run_step::<()>(Step::ServerConfig, || Err(StepError::Failed("boom".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ServerConfigFailed { backend: BackendId::Apache, .. }
        ));
        assert!(runner.into_warnings().is_empty());
    }

    #[test]
    fn certificate_failure_is_its_own_category() {
        let mut runner = StepRunner::new(BackendId::Nginx);
        let err = runner
            .run_step::<()>(Step::Certificate, || Err(StepError::Failed("no mkcert".into())))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::CertificateSetupFailed(_)));
    }

    #[test]
    fn teardown_steps_never_abort() {
        for step in [Step::DisableSite, Step::RemoveHostsEntry, Step::Permissions] {
            assert_eq!(step.policy(), StepPolicy::WarnOnError, "{step}");
        }
    }
}
