//! Zyra CLI entry point.

use clap::Parser;

use zyra::cli::{commands, handle_error, Cli, Commands};
use zyra::infrastructure::config::ConfigLoader;
use zyra::infrastructure::logging::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Watch => commands::watch::execute(&config, cli.json).await,
        Commands::Status => commands::status::execute(&config, cli.json).await,
        Commands::Detect => commands::detect::execute(&config, cli.json).await,
        Commands::Approve(args) => commands::approve::execute(args, &config, cli.json).await,
        Commands::Activity(args) => commands::activity::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
