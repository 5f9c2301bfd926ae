//! Main entry point for tablediff CLI

use clap::Parser;

mod cli;
mod commands;
mod output;
mod progress;

use cli::Cli;
use commands::{execute_command, Outcome};

fn main() {
    // Load environment variables from .env file if present
    if std::path::Path::new(".env").exists() {
        if let Err(e) = dotenv::dotenv() {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    // Execute the command
    match execute_command(cli.command) {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Differences) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}
