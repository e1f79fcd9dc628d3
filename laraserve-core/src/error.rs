//! Error types for laraserve-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from registry and settings operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry or settings file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The registry file exists but cannot be parsed. Never silently discarded.
    #[error("site registry at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The settings file exists but cannot be parsed.
    #[error("failed to parse settings at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No home directory could be resolved for the invoking user.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
