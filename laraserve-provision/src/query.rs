//! Read-only listing of registered sites.

use std::path::Path;

use serde::Serialize;

use laraserve_core::error::RegistryError;
use laraserve_core::registry;
use laraserve_core::types::SiteRecord;

/// Registered sites plus display-only tool-chain metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteListing {
    pub sites: Vec<SiteRecord>,
    /// Installed PHP `major.minor`. Never persisted.
    pub toolchain: Option<String>,
}

/// All sites in insertion order.
pub fn list_at(home: &Path, toolchain: Option<String>) -> Result<SiteListing, RegistryError> {
    Ok(SiteListing {
        sites: registry::load_at(home)?,
        toolchain,
    })
}
