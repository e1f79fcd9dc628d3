//! Production capability providers for Debian-style Linux hosts.

use std::path::PathBuf;
use std::rc::Rc;

use laraserve_core::types::BackendId;
use laraserve_core::{Identity, Settings};
use laraserve_detector::Probe;
use laraserve_renderer::Renderer;

use crate::capability::{BackendTable, Capabilities};
use crate::command::{CommandRunner, SystemRunner};

pub mod apache;
pub mod hosts;
pub mod nginx;
pub mod permissions;
pub mod ssl;

pub use apache::ApacheConfigurator;
pub use hosts::HostsFile;
pub use nginx::NginxConfigurator;
pub use permissions::AclPermissionFixer;
pub use ssl::MkcertIssuer;

/// Wire every provider for the running system.
///
/// `fpm_socket` is the PHP-FPM socket the rendered configs forward to, if any.
pub fn system_capabilities(
    identity: &Identity,
    settings: &Settings,
    renderer: Renderer,
    fpm_socket: Option<PathBuf>,
) -> Capabilities {
    let probe = Probe::system();
    let runner: Rc<dyn CommandRunner> = Rc::new(SystemRunner::new(probe.clone()));
    capabilities_with(identity, settings, renderer, fpm_socket, probe, runner)
}

fn permission_fixer(
    identity: &Identity,
    settings: &Settings,
    runner: Rc<dyn CommandRunner>,
) -> AclPermissionFixer {
    BackendId::all().iter().fold(
        AclPermissionFixer::new(identity.clone(), settings.web_group.clone(), runner),
        |fixer, backend| fixer.with_backend_group(*backend, settings.web_group_for(*backend)),
    )
}

/// Like [`system_capabilities`] with an explicit probe and command runner.
pub fn capabilities_with(
    identity: &Identity,
    settings: &Settings,
    renderer: Renderer,
    fpm_socket: Option<PathBuf>,
    probe: Probe,
    runner: Rc<dyn CommandRunner>,
) -> Capabilities {
    let renderer = Rc::new(renderer);
    let servers = BackendTable::new()
        .with(Box::new(ApacheConfigurator::new(
            settings.apache.sites_available.clone(),
            fpm_socket.clone(),
            renderer.clone(),
            probe.clone(),
            runner.clone(),
        )))
        .with(Box::new(NginxConfigurator::new(
            settings.nginx.clone(),
            fpm_socket,
            renderer,
            probe,
            runner.clone(),
        )));

    Capabilities {
        hosts: Box::new(HostsFile::new(settings.hosts_file.clone())),
        certs: Box::new(MkcertIssuer::new(
            identity.clone(),
            settings.ssl.clone(),
            settings.web_user.clone(),
            runner.clone(),
        )),
        permissions: Box::new(permission_fixer(identity, settings, runner)),
        servers,
    }
}
