//! laraserve: local development virtual hosts for Apache and Nginx.
//!
//! # Usage
//!
//! ```text
//! laraserve add <domain> --path <dir> [--server apache|nginx] [--ssl]
//! laraserve remove <domain>
//! laraserve list [--json]
//! laraserve detect
//! ```
//!
//! Most commands touch `/etc` and are meant to run under `sudo`; the site
//! registry still lives in the invoking user's home.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{add::AddArgs, detect::DetectArgs, list::ListArgs, remove::RemoveArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "laraserve",
    version,
    about = "Provision local development sites on Apache or Nginx",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision a site: permissions, optional TLS, server config, hosts entry.
    Add(AddArgs),

    /// Tear down a site. The document root is left untouched.
    Remove(RemoveArgs),

    /// List registered sites.
    List(ListArgs),

    /// Show installed web servers and the PHP version.
    Detect(DetectArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Add(args) => args.run(),
        Commands::Remove(args) => args.run(),
        Commands::List(args) => args.run(),
        Commands::Detect(args) => args.run(),
    }
}
