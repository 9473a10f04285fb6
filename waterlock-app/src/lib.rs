pub mod cli;
pub mod config;
pub mod console;
pub mod screen;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{load_config, AppConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use waterlock_connector::{
    controller::{StatusMessage, WaterLockController},
    link::{self, Platform},
};

/// The main entry point for running the application logic.
/// This function handles CLI parsing, configuration, and dispatches the subcommand.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(run_cmd) => {
            let config = load_config_from_cli(run_cmd)?;
            waterlock_logger::init(&config.app.log)?;
            tracing::info!("Configuration loaded: {:#?}", &config);
            let (controller, status_rx) = start_controller(&config)?;
            console::run(controller, status_rx).await
        }
        Commands::Tap(run_cmd) => {
            let config = load_config_from_cli(run_cmd)?;
            waterlock_logger::init(&config.app.log)?;
            let status = tap_once(&config).await?;
            println!("{}", status);
            Ok(())
        }
    }
}

/// Loads the configuration based on the provided CLI command.
fn load_config_from_cli(run_cmd: cli::RunCmd) -> Result<AppConfig> {
    if let Some(config_path) = run_cmd.config {
        println!("Loading configuration from '{}'", &config_path);
        load_config(&config_path)
    } else {
        println!("No config file provided, using default settings.");
        Ok(AppConfig::default())
    }
}

/// Builds the selected link against the simulated companion and wraps it in a controller.
pub fn start_controller(
    config: &AppConfig,
) -> Result<(WaterLockController, mpsc::Receiver<StatusMessage>)> {
    config.validate()?;
    let connector = Arc::new(config.connector.clone());
    let companion = Arc::new(config.app.companion.build());
    let link = link::start(connector.clone(), Platform::simulated(companion));
    Ok(WaterLockController::new(
        link,
        connector.channels.status_buffer,
    ))
}

/// Performs a single tap and returns the status message the user would see.
pub async fn tap_once(config: &AppConfig) -> Result<StatusMessage> {
    let (controller, mut status_rx) = start_controller(config)?;
    controller
        .on_tap()
        .await
        .context("Water Lock task panicked")?;
    let status = status_rx
        .recv()
        .await
        .context("Controller closed without reporting a status")?;
    controller.link().shutdown().await;
    Ok(status)
}
