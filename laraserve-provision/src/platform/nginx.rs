//! Nginx (Debian layout): `sites-available` + symlink in `sites-enabled`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use laraserve_core::settings::NginxSettings;
use laraserve_core::types::BackendId;
use laraserve_detector::Probe;
use laraserve_renderer::{Renderer, VhostContext};

use crate::capability::{EnableRequest, ServerConfigurator};
use crate::command::{CommandRunner, CommandSpec};
use crate::error::{io_err, StepError};
use crate::writer::{atomic_write, remove_if_exists};

pub struct NginxConfigurator {
    layout: NginxSettings,
    fpm_socket: Option<PathBuf>,
    renderer: Rc<Renderer>,
    probe: Probe,
    runner: Rc<dyn CommandRunner>,
}

impl NginxConfigurator {
    pub fn new(
        layout: NginxSettings,
        fpm_socket: Option<PathBuf>,
        renderer: Rc<Renderer>,
        probe: Probe,
        runner: Rc<dyn CommandRunner>,
    ) -> Self {
        Self {
            layout,
            fpm_socket,
            renderer,
            probe,
            runner,
        }
    }

    /// `<sites-available>/<domain>`
    pub fn config_path(&self, domain: &str) -> PathBuf {
        self.layout.sites_available.join(domain)
    }

    /// `<sites-enabled>/<domain>`
    pub fn enabled_path(&self, domain: &str) -> PathBuf {
        self.layout.sites_enabled.join(domain)
    }

    fn test_and_reload(&self) -> Result<(), StepError> {
        self.runner.run(&CommandSpec::new("nginx").arg("-t"))?;
        self.runner
            .run(&CommandSpec::new("nginx").args(["-s", "reload"]))?;
        tracing::info!("nginx reloaded");
        Ok(())
    }
}

impl ServerConfigurator for NginxConfigurator {
    fn backend(&self) -> BackendId {
        BackendId::Nginx
    }

    fn is_installed(&self) -> bool {
        self.probe.is_installed(BackendId::Nginx)
    }

    fn enable_site(&self, request: &EnableRequest<'_>) -> Result<(), StepError> {
        let mut ctx = VhostContext::new(request.domain, request.document_root, request.tls);
        if let Some(socket) = &self.fpm_socket {
            ctx = ctx.with_fpm_socket(socket);
        }
        let content = self.renderer.render(BackendId::Nginx, &ctx)?;

        let config = self.config_path(request.domain);
        atomic_write(&config, &content)?;

        let link = self.enabled_path(request.domain);
        if link_exists(&link) {
            tracing::debug!(link = %link.display(), "site already enabled");
        } else {
            if let Some(parent) = link.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            symlink(&config, &link).map_err(|e| io_err(&link, e))?;
            tracing::info!(link = %link.display(), "site enabled");
        }

        self.test_and_reload()
    }

    fn disable_site(&self, domain: &str) -> Result<(), StepError> {
        let link = self.enabled_path(domain);
        if link_exists(&link) {
            fs::remove_file(&link).map_err(|e| io_err(&link, e))?;
        }
        remove_if_exists(&self.config_path(domain))?;
        self.test_and_reload()
    }
}

/// `true` for any entry at `path`, including a dangling symlink.
fn link_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    fs::copy(original, link).map(|_| ())
}
