//! laraserve core library: domain types, registry persistence, settings, errors.
//!
//! - [`types`]: site records, backends, intents
//! - [`error`]: [`RegistryError`]
//! - [`registry`]: load / save / upsert / remove
//! - [`settings`]: optional `config.yaml`
//! - [`identity`]: the invoking user

pub mod error;
pub mod identity;
pub mod registry;
pub mod settings;
pub mod types;

pub use error::RegistryError;
pub use identity::Identity;
pub use settings::Settings;
pub use types::{BackendId, CertPaths, RegistryFile, SiteIntent, SiteRecord};
