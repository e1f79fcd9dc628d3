//! Apache (Debian layout): `sites-available` + `a2ensite`.

use std::path::PathBuf;
use std::rc::Rc;

use laraserve_core::types::BackendId;
use laraserve_detector::Probe;
use laraserve_renderer::{Renderer, VhostContext};

use crate::capability::{EnableRequest, ServerConfigurator};
use crate::command::{CommandRunner, CommandSpec};
use crate::error::StepError;
use crate::writer::{atomic_write, remove_if_exists};

const CONTROL_PROGRAMS: &[&str] = &["apachectl", "apache2ctl"];

pub struct ApacheConfigurator {
    sites_available: PathBuf,
    fpm_socket: Option<PathBuf>,
    renderer: Rc<Renderer>,
    probe: Probe,
    runner: Rc<dyn CommandRunner>,
}

impl ApacheConfigurator {
    pub fn new(
        sites_available: impl Into<PathBuf>,
        fpm_socket: Option<PathBuf>,
        renderer: Rc<Renderer>,
        probe: Probe,
        runner: Rc<dyn CommandRunner>,
    ) -> Self {
        Self {
            sites_available: sites_available.into(),
            fpm_socket,
            renderer,
            probe,
            runner,
        }
    }

    fn site_name(domain: &str) -> String {
        format!("{domain}.conf")
    }

    /// `<sites-available>/<domain>.conf`
    pub fn config_path(&self, domain: &str) -> PathBuf {
        self.sites_available.join(Self::site_name(domain))
    }

    /// Run `cmd`, logging instead of failing.
    fn run_lenient(&self, cmd: CommandSpec) {
        if let Err(e) = self.runner.run(&cmd) {
            tracing::warn!(command = %cmd, error = %e, "apache helper failed, continuing");
        }
    }

    /// Graceful reload through the first control program that works.
    fn reload(&self) -> Result<(), StepError> {
        let mut last_err = None;
        for program in CONTROL_PROGRAMS {
            match self.runner.run(&CommandSpec::new(*program).arg("graceful")) {
                Ok(()) => {
                    tracing::info!(%program, "apache reloaded");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(%program, error = %e, "reload attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| StepError::Failed("no apache control program".into())))
    }

    fn render(&self, request: &EnableRequest<'_>) -> Result<String, StepError> {
        let mut ctx = VhostContext::new(request.domain, request.document_root, request.tls);
        if let Some(socket) = &self.fpm_socket {
            ctx = ctx.with_fpm_socket(socket);
        }
        Ok(self.renderer.render(BackendId::Apache, &ctx)?)
    }
}

impl ServerConfigurator for ApacheConfigurator {
    fn backend(&self) -> BackendId {
        BackendId::Apache
    }

    fn is_installed(&self) -> bool {
        self.probe.is_installed(BackendId::Apache)
    }

    fn enable_site(&self, request: &EnableRequest<'_>) -> Result<(), StepError> {
        let content = self.render(request)?;
        atomic_write(&self.config_path(request.domain), &content)?;

        if request.tls.is_some() {
            self.run_lenient(CommandSpec::new("a2enmod").arg("ssl"));
        }
        self.run_lenient(CommandSpec::new("a2ensite").arg(Self::site_name(request.domain)));
        self.reload()
    }

    fn disable_site(&self, domain: &str) -> Result<(), StepError> {
        self.run_lenient(CommandSpec::new("a2dissite").arg(Self::site_name(domain)));
        remove_if_exists(&self.config_path(domain))?;
        self.reload()
    }
}
