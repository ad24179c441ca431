//! notesync CLI
//!
//! Mirrors note attachments from a provider snapshot into a local directory.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)
        .map_err(|e| CliError::user(format!("Failed to initialize logging: {}", e)))?;
    tracing::debug!("Verbose mode enabled");

    commands::run_sync(&cli)
}
