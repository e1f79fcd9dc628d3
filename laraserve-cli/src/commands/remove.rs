//! `laraserve remove`: tear down a site.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use laraserve_provision::Provisioner;

use super::{print_warnings, Session};

/// Arguments for `laraserve remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Domain of a registered site.
    pub domain: String,
}

impl RemoveArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let caps = session.teardown_capabilities()?;
        let report = Provisioner::new(&session.identity.home, &caps)
            .deprovision(&self.domain)
            .with_context(|| format!("failed to remove '{}'", self.domain))?;

        print_warnings(&report.warnings);
        println!(
            "{} '{}' removed from {}",
            "✓".green().bold(),
            report.record.domain,
            report.record.server
        );
        println!(
            "  ·  document root kept at {}",
            report.record.path.display()
        );
        Ok(())
    }
}
