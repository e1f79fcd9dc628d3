//! `laraserve add`: provision a site.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use laraserve_core::types::{BackendId, SiteIntent};
use laraserve_provision::{HostsOutcome, ProvisionReport, Provisioner};

use super::{print_warnings, Session};

/// Arguments for `laraserve add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Domain to serve, e.g. `shop.test`.
    pub domain: String,

    /// Document root to serve.
    #[arg(long)]
    pub path: PathBuf,

    /// Web server to configure (apache or nginx). Auto-detected when omitted.
    #[arg(long)]
    pub server: Option<BackendId>,

    /// Issue a locally trusted TLS certificate with mkcert.
    #[arg(long)]
    pub ssl: bool,
}

impl AddArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let caps = session.capabilities()?;
        let intent = SiteIntent {
            domain: self.domain.clone(),
            path: self.path,
            server: self.server,
            ssl: self.ssl,
        };
        let report = Provisioner::new(&session.identity.home, &caps)
            .provision(&intent)
            .with_context(|| format!("failed to add '{}'", self.domain))?;

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &ProvisionReport) {
    print_warnings(&report.warnings);

    let record = &report.record;
    let scheme = if record.ssl { "https" } else { "http" };
    println!(
        "{} '{}' served by {} from {}",
        "✓".green().bold(),
        record.domain,
        record.server,
        record.path.display()
    );
    if let Some(certs) = &report.certificate {
        println!("  🔒 {}", certs.cert_file.display());
    }
    if report.hosts == Some(HostsOutcome::AlreadyPresent) {
        println!("  ·  hosts entry already present");
    }
    println!("  →  {scheme}://{}", record.domain);
}
