//! # laraserve-provision
//!
//! Site provisioning and teardown.
//!
//! [`Provisioner::provision`] applies a [`SiteIntent`](laraserve_core::SiteIntent)
//! step by step through the [`capability`] traits and records the site last;
//! [`Provisioner::deprovision`] undoes it best-effort. [`list_at`] reads the
//! registry. Production providers live in [`platform`].

pub mod capability;
pub mod command;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod query;
pub mod step;
pub mod validate;
pub mod writer;

pub use capability::{
    BackendTable, Capabilities, CertIssuer, EnableRequest, HostsEditor, HostsOutcome,
    PermissionFixer, ServerConfigurator, LOOPBACK_IP,
};
pub use error::{ProvisionError, StepError};
pub use orchestrator::{DeprovisionReport, ProvisionReport, Provisioner};
pub use query::{list_at, SiteListing};
pub use step::{Step, StepPolicy, StepWarning};
pub use writer::WriteResult;
