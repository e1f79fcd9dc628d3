//! Locally trusted certificates via `mkcert`.
//!
//! Certificates are written to `<cert_root>/<domain>/<domain>.pem` and
//! `<domain>-key.pem`. `mkcert` itself is installed on first use from the
//! pinned release URL in the settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use laraserve_core::settings::SslSettings;
use laraserve_core::types::CertPaths;
use laraserve_core::Identity;

use crate::capability::CertIssuer;
use crate::command::{CommandRunner, CommandSpec};
use crate::error::{io_err, StepError};

pub struct MkcertIssuer {
    identity: Identity,
    settings: SslSettings,
    web_user: String,
    runner: Rc<dyn CommandRunner>,
}

impl MkcertIssuer {
    pub fn new(
        identity: Identity,
        settings: SslSettings,
        web_user: impl Into<String>,
        runner: Rc<dyn CommandRunner>,
    ) -> Self {
        Self {
            identity,
            settings,
            web_user: web_user.into(),
            runner,
        }
    }

    /// `<cert_root>/<domain>/`
    pub fn cert_dir(&self, domain: &str) -> PathBuf {
        self.settings.cert_root.join(domain)
    }

    pub fn cert_paths(&self, domain: &str) -> CertPaths {
        let dir = self.cert_dir(domain);
        CertPaths {
            cert_file: dir.join(format!("{domain}.pem")),
            key_file: dir.join(format!("{domain}-key.pem")),
        }
    }

    /// The `mkcert` program to run, downloading it if needed.
    fn ensure_mkcert(&self) -> Result<String, StepError> {
        let configured = &self.settings.mkcert_path;
        if configured.is_file() {
            return Ok(configured.display().to_string());
        }
        if self.runner.is_available("mkcert") {
            return Ok("mkcert".to_string());
        }
        tracing::info!(url = %self.settings.mkcert_url, "mkcert not found, downloading");
        download_executable(&self.settings.mkcert_url, configured)?;
        Ok(configured.display().to_string())
    }

    fn mkcert(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program)
            .env("HOME", self.identity.home.display().to_string())
            .env("USER", self.identity.user.clone())
    }

    fn grant_web_user_read(&self, dir: &Path, certs: &CertPaths) {
        let target = dir.display().to_string();
        let acl = format!("u:{}:rX", self.web_user);
        let via_acl = self
            .runner
            .run(&CommandSpec::new("setfacl").args(["-R", "-m", acl.as_str(), target.as_str()]))
            .and_then(|()| {
                self.runner.run(
                    &CommandSpec::new("setfacl")
                        .args(["-R", "-d", "-m", acl.as_str(), target.as_str()]),
                )
            });
        if let Err(e) = via_acl {
            tracing::warn!(dir = %target, error = %e, "ACL failed, falling back to chmod");
            if let Err(e) = chmod_certs(dir, certs) {
                tracing::warn!(dir = %target, error = %e, "could not relax certificate permissions");
            }
        }
    }
}

impl CertIssuer for MkcertIssuer {
    fn setup_ssl(&self, domain: &str) -> Result<CertPaths, StepError> {
        let program = self.ensure_mkcert()?;

        if let Err(e) = self.runner.run(&self.mkcert(&program).arg("-install")) {
            tracing::warn!(error = %e, "mkcert -install failed; browsers may not trust the certificate");
        }

        let dir = self.cert_dir(domain);
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let certs = self.cert_paths(domain);
        self.runner.run(&self.mkcert(&program).args([
            "-cert-file".to_string(),
            certs.cert_file.display().to_string(),
            "-key-file".to_string(),
            certs.key_file.display().to_string(),
            domain.to_string(),
        ]))?;

        self.grant_web_user_read(&dir, &certs);
        tracing::info!(%domain, cert = %certs.cert_file.display(), "certificate issued");
        Ok(certs)
    }
}

/// Fetch `url` to `dest` via a temp sibling and make it executable.
pub fn download_executable(url: &str, dest: &Path) -> Result<(), StepError> {
    let download_err = |message: String| StepError::Download {
        url: url.to_string(),
        message,
    };
    let response = ureq::get(url)
        .call()
        .map_err(|e| download_err(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.download", dest.display()));
    let result = (|| {
        let mut file = fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        io::copy(&mut response.into_reader(), &mut file)
            .map_err(|e| download_err(e.to_string()))?;
        set_mode(&tmp, 0o755)?;
        fs::rename(&tmp, dest).map_err(|e| io_err(dest, e))
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn chmod_certs(dir: &Path, certs: &CertPaths) -> Result<(), StepError> {
    set_mode(&certs.cert_file, 0o644)?;
    set_mode(&certs.key_file, 0o640)?;
    set_mode(dir, 0o755)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StepError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), StepError> {
    Ok(())
}
