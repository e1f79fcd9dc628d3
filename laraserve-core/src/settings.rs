//! Optional user settings loaded from `<home>/.laraserve/config.yaml`.
//!
//! Every field has a default matching a stock Debian/Ubuntu layout, so a
//! missing file (or a partial one) is always valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::registry::{read_optional, state_dir_at};
use crate::types::BackendId;

pub const SETTINGS_FILE: &str = "config.yaml";
pub const TEMPLATES_DIR: &str = "templates";

const MKCERT_URL: &str =
    "https://github.com/FiloSottile/mkcert/releases/download/v1.4.4/mkcert-v1.4.4-linux-amd64";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hosts_file: PathBuf,
    /// User the web server runs as; granted read access to certificates.
    pub web_user: String,
    /// Group given ownership of document roots, unless the backend names its own.
    pub web_group: String,
    pub apache: ApacheSettings,
    pub nginx: NginxSettings,
    pub ssl: SslSettings,
    pub php: PhpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApacheSettings {
    pub sites_available: PathBuf,
    /// Run-time group of httpd when it differs from `web_group` (`apache` on RHEL).
    pub web_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxSettings {
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    pub web_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslSettings {
    /// Certificates land in `<cert_root>/<domain>/`.
    pub cert_root: PathBuf,
    pub mkcert_path: PathBuf,
    pub mkcert_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhpSettings {
    pub fpm_socket_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hosts_file: PathBuf::from("/etc/hosts"),
            web_user: "www-data".to_string(),
            web_group: "www-data".to_string(),
            apache: ApacheSettings::default(),
            nginx: NginxSettings::default(),
            ssl: SslSettings::default(),
            php: PhpSettings::default(),
        }
    }
}

impl Default for ApacheSettings {
    fn default() -> Self {
        Self {
            sites_available: PathBuf::from("/etc/apache2/sites-available"),
            web_group: None,
        }
    }
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            web_group: None,
        }
    }
}

impl Default for SslSettings {
    fn default() -> Self {
        Self {
            cert_root: PathBuf::from("/etc/ssl"),
            mkcert_path: PathBuf::from("/usr/local/bin/mkcert"),
            mkcert_url: MKCERT_URL.to_string(),
        }
    }
}

impl Default for PhpSettings {
    fn default() -> Self {
        Self {
            fpm_socket_dir: PathBuf::from("/var/run/php"),
        }
    }
}

impl Settings {
    /// Group the `backend` runs as.
    pub fn web_group_for(&self, backend: BackendId) -> &str {
        let specific = match backend {
            BackendId::Apache => self.apache.web_group.as_deref(),
            BackendId::Nginx => self.nginx.web_group.as_deref(),
        };
        specific.unwrap_or(&self.web_group)
    }
}

/// `<home>/.laraserve/config.yaml`
pub fn settings_path_at(home: &Path) -> PathBuf {
    state_dir_at(home).join(SETTINGS_FILE)
}

/// `<home>/.laraserve/templates/`
pub fn templates_dir_at(home: &Path) -> PathBuf {
    state_dir_at(home).join(TEMPLATES_DIR)
}

/// Load settings, falling back to defaults when the file is absent.
pub fn load_settings_at(home: &Path) -> Result<Settings, RegistryError> {
    let path = settings_path_at(home);
    let Some(contents) = read_optional(&path)? else {
        return Ok(Settings::default());
    };
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Settings { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let home = TempDir::new().unwrap();
        let settings = load_settings_at(home.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.hosts_file, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let home = TempDir::new().unwrap();
        let dir = state_dir_at(home.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(SETTINGS_FILE),
            "hosts_file: /tmp/hosts\nnginx:\n  sites_enabled: /tmp/enabled\n",
        )
        .unwrap();

        let settings = load_settings_at(home.path()).unwrap();
        assert_eq!(settings.hosts_file, PathBuf::from("/tmp/hosts"));
        assert_eq!(settings.nginx.sites_enabled, PathBuf::from("/tmp/enabled"));
        assert_eq!(
            settings.nginx.sites_available,
            PathBuf::from("/etc/nginx/sites-available")
        );
        assert_eq!(settings.web_group, "www-data");
    }

    #[test]
    fn backend_group_overrides_shared_group() {
        let home = TempDir::new().unwrap();
        let dir = state_dir_at(home.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SETTINGS_FILE), "nginx:\n  web_group: nginx\n").unwrap();

        let settings = load_settings_at(home.path()).unwrap();
        assert_eq!(settings.web_group_for(BackendId::Nginx), "nginx");
        assert_eq!(settings.web_group_for(BackendId::Apache), "www-data");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let home = TempDir::new().unwrap();
        let dir = state_dir_at(home.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SETTINGS_FILE), "hosts_file: [unclosed").unwrap();

        let err = load_settings_at(home.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Settings { .. }), "got: {err}");
    }

    #[test]
    fn unreadable_settings_path_is_an_error() {
        let home = TempDir::new().unwrap();
        std::fs::write(state_dir_at(home.path()), "not a dir").unwrap();

        let err = load_settings_at(home.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Unreadable { .. }), "got: {err}");
    }
}
