//! Binary entry point for the `pymend` repair tool.

use anyhow::Result;
use clap::Parser;
use pymend::cli::{Cli, Commands};
use pymend::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    match cli.command {
        Commands::Repair(args) => commands::repair::run(&args, stdout.lock()),
        Commands::Rules { json } => commands::rules::run(json, stdout.lock()),
    }
}
