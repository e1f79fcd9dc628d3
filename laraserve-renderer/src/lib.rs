//! # laraserve-renderer
//!
//! Tera-based rendering of per-site web-server configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use laraserve_core::types::BackendId;
//! use laraserve_renderer::{Renderer, VhostContext};
//!
//! fn render_nginx() -> Result<String, laraserve_renderer::RenderError> {
//!     let renderer = Renderer::new()?;
//!     let ctx = VhostContext::new("blog.test", Path::new("/srv/blog/public"), None);
//!     renderer.render(BackendId::Nginx, &ctx)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::VhostContext;
pub use engine::{template_name, Renderer};
pub use error::RenderError;
