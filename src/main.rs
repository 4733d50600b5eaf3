use std::sync::Arc;

use anyhow::{Context, Result};
use smoke_watch::{AirQualityOrchestrator, SmokeWatchConfig, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SmokeWatchConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging).context("Failed to initialise logging")?;

    tracing::info!(
        version = smoke_watch::VERSION,
        source = ?config.pollution.source,
        "Starting SmokeWatch"
    );

    let orchestrator = AirQualityOrchestrator::from_config(&config)
        .context("Failed to set up air quality providers")?;

    web::run(&config.server, Arc::new(orchestrator))
        .await
        .context("Web server stopped")?;

    Ok(())
}
