//! Subcommand implementations and the per-invocation session they share.

pub mod add;
pub mod detect;
pub mod list;
pub mod remove;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use laraserve_core::settings::{load_settings_at, templates_dir_at};
use laraserve_core::{Identity, Settings};
use laraserve_detector::{php_fpm_socket, php_version};
use laraserve_provision::{platform, Capabilities, StepWarning};
use laraserve_renderer::Renderer;

/// Who invoked us and which settings apply. Resolved once per command.
pub struct Session {
    pub identity: Identity,
    pub settings: Settings,
}

impl Session {
    pub fn load() -> Result<Self> {
        let identity = Identity::resolve().context("could not determine home directory")?;
        tracing::debug!(user = %identity.user, home = %identity.home.display(), "resolved identity");
        let settings = load_settings_at(&identity.home).context("failed to load settings")?;
        Ok(Self { identity, settings })
    }

    /// Production providers, with user template overrides applied.
    pub fn capabilities(&self) -> Result<Capabilities> {
        let overrides = templates_dir_at(&self.identity.home);
        let renderer = Renderer::with_overrides(Some(&overrides))
            .with_context(|| format!("failed to load templates from {}", overrides.display()))?;
        let fpm_socket = self.fpm_socket();
        Ok(platform::system_capabilities(
            &self.identity,
            &self.settings,
            renderer,
            fpm_socket,
        ))
    }

    /// Providers for teardown. Disabling a site renders nothing, so user
    /// template overrides and PHP detection are skipped.
    pub fn teardown_capabilities(&self) -> Result<Capabilities> {
        let renderer = Renderer::new().context("failed to load built-in templates")?;
        Ok(platform::system_capabilities(
            &self.identity,
            &self.settings,
            renderer,
            None,
        ))
    }

    fn fpm_socket(&self) -> Option<PathBuf> {
        let version = php_toolchain()?;
        Some(php_fpm_socket(&self.settings.php.fpm_socket_dir, &version))
    }
}

/// Installed PHP `major.minor`; detection problems only reach the debug log.
pub fn php_toolchain() -> Option<String> {
    match php_version() {
        Ok(version) => version,
        Err(e) => {
            tracing::debug!(error = %e, "php version detection failed");
            None
        }
    }
}

pub fn print_warnings(warnings: &[StepWarning]) {
    for warning in warnings {
        println!("{} {warning}", "⚠".yellow().bold());
    }
}
