//! Main entry point for recondiff CLI

use clap::Parser;
use recondiff::cli::Cli;
use recondiff::commands::execute_command;
use recondiff::config::Settings;

fn main() {
    // Load .env before reading any settings
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up verbose logging if requested
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let settings = Settings::from_env();

    // Execute the command
    if let Err(e) = execute_command(cli.command, &settings) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
