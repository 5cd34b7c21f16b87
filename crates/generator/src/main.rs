//! coldstore-generator - synthetic cold-storage sensor stream
//!
//! Runs the reading generation loop against the CSV stream file and serves
//! health and metrics endpoints until interrupted.

use anyhow::Result;
use coldstore_generator::{api, config::GeneratorConfig};
use monitor_lib::{
    generator::GenerationLoopBuilder, stream::CsvSink, HealthRegistry, StructuredLogger,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = GeneratorConfig::load()?;
    info!(
        output_path = %config.output_path,
        interval_secs = config.interval_secs,
        seeded = config.seed.is_some(),
        "Generator configured"
    );

    let health_registry = HealthRegistry::new(config.interval());
    let logger = StructuredLogger::new(&config.site_name);

    let generation = GenerationLoopBuilder::new()
        .sink(Arc::new(CsvSink::new(&config.output_path)))
        .health(health_registry.clone())
        .logger(logger.clone())
        .interval(config.interval())
        .violation_probability(config.violation_probability)
        .seed(config.seed)
        .build()?;

    logger.log_startup(GENERATOR_VERSION, &config.output_path, config.interval_secs);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let generation_handle = tokio::spawn(generation.run(shutdown_rx));

    let app_state = Arc::new(api::AppState { health_registry });
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");

    let _ = shutdown_tx.send(());
    if let Err(e) = generation_handle.await {
        warn!(error = %e, "Generation loop did not stop cleanly");
    }
    api_handle.abort();

    Ok(())
}
