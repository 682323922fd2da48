use anyhow::Result;
use clap::Parser;
use tracing::warn;

use chatterm::{
    app::{load_config, load_config_from, Config},
    cli::{handle_command, Cli, Commands},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        load_config_from(config_path)?
    } else {
        load_config().unwrap_or_else(|e| {
            warn!("{:#}, using defaults", e);
            Config::default()
        })
    };

    let command = cli.command.unwrap_or(Commands::Status);
    handle_command(&command, &config).await
}
