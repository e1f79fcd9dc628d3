//! Template context: serializable rendering payload for one site.

use std::path::Path;

use serde::{Deserialize, Serialize};

use laraserve_core::types::CertPaths;

use crate::error::RenderError;

/// Everything a server-config template may reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VhostContext {
    pub domain: String,
    pub document_root: String,
    pub ssl: bool,
    /// Present only when `ssl` is true.
    pub tls: Option<TlsCtx>,
    /// `fastcgi_pass` target, e.g. `unix:/var/run/php/php8.3-fpm.sock`.
    /// `None` when no PHP-FPM socket is known.
    pub fastcgi_pass: Option<String>,
    pub meta: MetaCtx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsCtx {
    pub cert_file: String,
    pub key_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub laraserve_version: String,
}

impl VhostContext {
    /// Build a context for `domain` served from `document_root`.
    pub fn new(domain: &str, document_root: &Path, tls: Option<&CertPaths>) -> Self {
        VhostContext {
            domain: domain.to_string(),
            document_root: document_root.display().to_string(),
            ssl: tls.is_some(),
            tls: tls.map(|c| TlsCtx {
                cert_file: c.cert_file.display().to_string(),
                key_file: c.key_file.display().to_string(),
            }),
            fastcgi_pass: None,
            meta: MetaCtx {
                laraserve_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Route PHP requests to the FPM socket at `socket`.
    pub fn with_fpm_socket(mut self, socket: &Path) -> Self {
        self.fastcgi_pass = Some(format!("unix:{}", socket.display()));
        self
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
