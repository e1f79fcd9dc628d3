//! Tera rendering engine for backend site configuration.
//!
//! | Backend | Template             | Written by the configurator to          |
//! |---------|----------------------|-----------------------------------------|
//! | Apache  | `apache/vhost.conf.tera` | `<sites-available>/<domain>.conf`   |
//! | Nginx   | `nginx/server.conf.tera` | `<sites-available>/<domain>`        |

use std::path::Path;

use tera::Tera;

use laraserve_core::types::BackendId;

use crate::context::VhostContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("shared/_header.tera", include_str!("templates/_partials/header.tera")),
    ("apache/vhost.conf.tera", include_str!("templates/apache.conf.tera")),
    ("nginx/server.conf.tera", include_str!("templates/nginx.conf.tera")),
];

/// Template rendered for `backend`.
pub fn template_name(backend: BackendId) -> &'static str {
    match backend {
        BackendId::Apache => "apache/vhost.conf.tera",
        BackendId::Nginx => "nginx/server.conf.tera",
    }
}

// ---------------------------------------------------------------------------
// Template loading
// ---------------------------------------------------------------------------

/// Override for the embedded template `name`, if `dir` holds one.
fn read_override(dir: &Path, name: &str) -> Result<Option<String>, RenderError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::Io { path, source }),
    }
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let override_dir = override_dir.filter(|dir| dir.exists());
    if let Some(dir) = override_dir {
        if !dir.is_dir() {
            return Err(RenderError::NotADirectory { path: dir.to_path_buf() });
        }
    }

    let mut templates = Vec::with_capacity(TPLS.len());
    for (name, embedded) in TPLS {
        let content = match override_dir {
            Some(dir) => read_override(dir, name)?,
            None => None,
        };
        templates.push((*name, content.unwrap_or_else(|| (*embedded).to_string())));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders backend configuration for a site.
///
/// Construct once per command; `override_dir` may contain files with the
/// same relative names as the embedded ones (`apache/vhost.conf.tera`,
/// `nginx/server.conf.tera`, `shared/_header.tera`) to replace them.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Embedded templates plus any overrides found in `override_dir`.
    pub fn with_overrides(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: build_tera(override_dir)?,
        })
    }

    /// Render the configuration for `backend`. Line endings are normalised to LF.
    pub fn render(&self, backend: BackendId, ctx: &VhostContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(template_name(backend), &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
