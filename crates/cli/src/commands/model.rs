//! Model management commands

use anyhow::Result;

use crate::client::{ApiClient, ModelInfo};
use crate::output::{format_bytes, format_timestamp, print_success, OutputFormat};

/// Show the currently loaded model (loading it on first use).
pub async fn info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let model: ModelInfo = client.get("api/v1/model").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        OutputFormat::Table => {
            println!("Version:  {}", model.version);
            println!("Source:   {}", model.source);
            println!("Schema:   {}", model.schema);
            println!("Size:     {}", format_bytes(model.size_bytes as u64));
            println!("Checksum: {}", model.checksum);
            println!("Loaded:   {}", format_timestamp(model.loaded_at));
        }
    }

    Ok(())
}

/// Drop the cached model and load the artifact again.
pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let model: ModelInfo = client
        .post("api/v1/model/reload", &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        OutputFormat::Table => {
            print_success(&format!("Model reloaded: {}", model.version));
        }
    }

    Ok(())
}
