//! Error types for laraserve-renderer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Template syntax error, missing variable, or failed context conversion.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading override templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The override location exists but is not a directory.
    #[error("template override path {path} is not a directory")]
    NotADirectory { path: PathBuf },
}
