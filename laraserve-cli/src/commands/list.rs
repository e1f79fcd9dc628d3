//! `laraserve list`: registered sites.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use laraserve_core::types::SiteRecord;
use laraserve_provision::{list_at, SiteListing};

use super::{php_toolchain, Session};

/// Arguments for `laraserve list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "domain")]
    domain: String,
    #[tabled(rename = "server")]
    server: String,
    #[tabled(rename = "tls")]
    tls: String,
    #[tabled(rename = "document root")]
    path: String,
}

impl From<&SiteRecord> for SiteRow {
    fn from(record: &SiteRecord) -> Self {
        SiteRow {
            domain: record.domain.clone(),
            server: record.server.to_string(),
            tls: if record.ssl { "yes" } else { "no" }.to_string(),
            path: record.path.display().to_string(),
        }
    }
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let listing = list_at(&session.identity.home, php_toolchain())
            .context("failed to load site registry")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&listing).context("failed to serialize site JSON")?
            );
            return Ok(());
        }
        print_table(&listing);
        Ok(())
    }
}

fn print_table(listing: &SiteListing) {
    let php = listing
        .toolchain
        .as_deref()
        .map(|v| format!("PHP {v}"))
        .unwrap_or_else(|| "PHP not found".to_string());
    println!(
        "laraserve v{} | {} sites | {php}",
        env!("CARGO_PKG_VERSION"),
        listing.sites.len(),
    );

    if listing.sites.is_empty() {
        println!("No sites registered.");
        println!("Run: laraserve add <domain> --path <dir>");
        return;
    }

    let rows: Vec<SiteRow> = listing.sites.iter().map(SiteRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let tls = listing.sites.iter().filter(|s| s.ssl).count();
    if tls > 0 {
        println!("{} {tls} with TLS", "🔒".bold());
    }
}
