//! Wattcast CLI
//!
//! A command-line tool for requesting power-consumption predictions and
//! exploring the historical actual-vs-predicted series served by
//! wattcast-server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{history, model, predict, schema};

/// Wattcast CLI
#[derive(Parser)]
#[command(name = "wattcast")]
#[command(author, version, about = "CLI for the wattcast power-consumption predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via WATTCAST_API_URL env var)
    #[arg(long, env = "WATTCAST_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a prediction for a single reading
    Predict(predict::PredictArgs),

    /// Show the active feature schema and its input bounds
    Schema,

    /// Inspect or reload the served model
    #[command(subcommand)]
    Model(ModelCommands),

    /// Historical actual-vs-predicted series
    #[command(subcommand)]
    History(HistoryCommands),
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Show the currently loaded model
    Info,

    /// Drop the cached model and load the artifact again
    Reload,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Actual vs predicted pairs from the historical sample
    Comparison {
        /// Number of pairs to fetch (server default when omitted)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mean consumption by hour of day
    Hourly,

    /// Histogram of recorded consumption
    Histogram {
        /// Number of bins
        #[arg(long, default_value_t = 30)]
        bins: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Predict(args) => predict::run(&client, args, cli.format).await?,
        Commands::Schema => schema::run(&client, cli.format).await?,
        Commands::Model(model_cmd) => match model_cmd {
            ModelCommands::Info => model::info(&client, cli.format).await?,
            ModelCommands::Reload => model::reload(&client, cli.format).await?,
        },
        Commands::History(history_cmd) => match history_cmd {
            HistoryCommands::Comparison { limit } => {
                history::comparison(&client, limit, cli.format).await?;
            }
            HistoryCommands::Hourly => history::hourly(&client, cli.format).await?,
            HistoryCommands::Histogram { bins } => {
                history::histogram(&client, bins, cli.format).await?;
            }
        },
    }

    Ok(())
}
