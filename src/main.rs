// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use model_promotion_pipeline::cli::{execute_command, Cli};
use model_promotion_pipeline::config::Settings;
use model_promotion_pipeline::utils::log_utils::init_logging;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize logging
    let log_file = init_logging(&settings.log_dir)?;
    info!("Logging to {}", log_file.display());

    execute_command(cli.command, settings).await
}
