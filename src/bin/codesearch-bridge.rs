use anyhow::{Context, Result};
use clap::Parser;
use std::process::exit;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codesearch_lib::{
    cli::{handle_command, CliArgs},
    config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Setup Tracing ---
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Parse Args ---
    let args = CliArgs::parse();

    // --- Load Configuration ---
    let config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // --- Execute Command ---
    tracing::debug!("Executing command: {:?}", args.command);
    if let Err(e) = handle_command(args.command, config).await {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        exit(1);
    }

    Ok(())
}
