//! # Integration Store CLI
//!
//! Loads layered configuration, initializes tracing and runs one command
//! against the configured database.

use anyhow::Context;
use clap::Parser;
use integration_store::{cli::Cli, config::ConfigLoader, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    cli.apply_overrides(&mut config)?;

    telemetry::init_tracing(&config)?;
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, profile = %config.profile, "configuration loaded");
    }

    let output = integration_store::cli::run(cli, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
