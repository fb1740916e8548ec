//! wattcast-server - household power-consumption prediction backend
//!
//! Serves predictions from a previously trained gradient-boosted model
//! plus the chart data a dashboard front end renders.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wattcast_lib::{FeatureAssembler, HistoricalSample, ModelHandle, ModelLoader, ServiceMetrics};
use wattcast_server::{api, config};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVER_VERSION, "Starting wattcast-server");

    let config = config::ServerConfig::load()?;
    let schema = config.schema()?;
    info!(
        schema = %config.model.schema,
        source = %config.model.source,
        "model configured, loads on first use"
    );

    let loader = ModelLoader::new(config.model_config()?)?;
    let model = ModelHandle::new(loader, schema.clone());
    let assembler = FeatureAssembler::new(schema);
    let metrics = ServiceMetrics::new();

    let history = match &config.history.csv_path {
        Some(path) => {
            let sample = HistoricalSample::from_csv_path(path).with_context(|| {
                format!("failed to load historical sample {}", path.display())
            })?;
            metrics.set_history_rows(sample.len() as i64);
            Some(Arc::new(sample))
        }
        None => {
            warn!("no historical sample configured, comparison endpoints disabled");
            None
        }
    };

    let state = Arc::new(api::AppState::new(
        model,
        assembler,
        history,
        config.history.comparison_limit,
        metrics,
    ));

    let _api_handle = tokio::spawn(api::serve(config.port, state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
