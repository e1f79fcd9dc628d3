//! Error types for laraserve-provision.

use std::path::PathBuf;

use thiserror::Error;

use laraserve_core::error::RegistryError;
use laraserve_core::types::BackendId;
use laraserve_renderer::RenderError;

/// What a capability provider returns when one of its operations fails.
#[derive(Debug, Error)]
pub enum StepError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("{0}")]
    Failed(String),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Convenience constructor for [`StepError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StepError {
    StepError::Io {
        path: path.into(),
        source,
    }
}

/// Why a provision or deprovision request failed.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid site: {0}")]
    Validation(String),

    #[error("no supported web server detected (install apache or nginx, or pass --server)")]
    NoServerDetected,

    #[error("fixing document root permissions failed: {0}")]
    PermissionsFailed(#[source] StepError),

    #[error("TLS certificate setup failed: {0}")]
    CertificateSetupFailed(#[source] StepError),

    #[error("{backend} configuration failed: {source}")]
    ServerConfigFailed {
        backend: BackendId,
        #[source]
        source: StepError,
    },

    #[error("hosts file update failed: {0}")]
    HostsUpdateFailed(#[source] StepError),

    #[error("site '{domain}' is not registered")]
    SiteNotFound { domain: String },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
