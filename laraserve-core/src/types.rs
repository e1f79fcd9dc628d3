//! Domain types for the laraserve site registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The web-server backend fronting a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    Apache,
    Nginx,
}

impl BackendId {
    /// Auto-detection preference, most preferred first.
    pub const PREFERENCE: [BackendId; 2] = [BackendId::Nginx, BackendId::Apache];

    /// All backends in a stable order.
    pub fn all() -> &'static [BackendId] {
        &[BackendId::Apache, BackendId::Nginx]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Apache => "apache",
            BackendId::Nginx => "nginx",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apache" | "apache2" | "httpd" => Ok(BackendId::Apache),
            "nginx" => Ok(BackendId::Nginx),
            other => Err(format!("unknown server '{other}'; expected: apache, nginx")),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One provisioned site. `domain` is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub domain: String,
    /// Absolute document root.
    pub path: PathBuf,
    pub server: BackendId,
    #[serde(default)]
    pub ssl: bool,
}

/// Caller-supplied description of a site to provision.
///
/// `server: None` asks the orchestrator to pick an installed backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIntent {
    pub domain: String,
    pub path: PathBuf,
    pub server: Option<BackendId>,
    pub ssl: bool,
}

/// Certificate and key written for a TLS-enabled site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertPaths {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Root of the on-disk registry document (`sites.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
}

impl RegistryFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(sites: Vec<SiteRecord>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            updated_at: Utc::now(),
            sites,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
