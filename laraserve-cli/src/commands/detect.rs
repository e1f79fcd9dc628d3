//! `laraserve detect`: what this machine can serve.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use laraserve_core::types::BackendId;
use laraserve_detector::{preferred_backend, Probe};

use super::php_toolchain;

/// Arguments for `laraserve detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {}

impl DetectArgs {
    pub fn run(self) -> Result<()> {
        let probe = Probe::system();
        let installed = probe.detect_installed();

        println!("{}", "Web servers".bold());
        for backend in BackendId::all() {
            let marker = if installed.contains(backend) {
                "✓".green().bold()
            } else {
                "✗".bright_black().bold()
            };
            println!("  {marker} {backend}");
        }

        match preferred_backend(&installed) {
            Some(backend) => println!("Default for `add`: {}", backend.to_string().bold()),
            None => println!(
                "{} no supported web server found; install apache or nginx",
                "⚠".yellow().bold()
            ),
        }

        match php_toolchain() {
            Some(version) => println!("PHP {version}"),
            None => println!("PHP not found"),
        }
        Ok(())
    }
}
