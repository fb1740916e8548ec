//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use wattcast_lib::{FeatureSchema, ModelConfig, ModelSource};

/// Server configuration, from optional `wattcast.toml` plus `WATTCAST_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    pub model: ModelSettings,

    #[serde(default)]
    pub history: HistorySettings,
}

/// Model artifact settings
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    /// Local path or http(s) URL of the serialized model
    pub source: String,

    /// Bound on remote artifact retrieval
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Directory for remotely fetched artifacts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Optional integrity checksum of the artifact
    #[serde(default)]
    pub sha256: Option<String>,

    /// Schema variant the model was trained on
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Historical sample settings
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    /// CSV of past readings; comparison endpoints are disabled when absent
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    /// Number of comparison pairs exposed for display
    #[serde(default = "default_comparison_limit")]
    pub comparison_limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            comparison_limit: default_comparison_limit(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("wattcast-models")
}

fn default_schema() -> String {
    "full".to_string()
}

fn default_comparison_limit() -> usize {
    wattcast_lib::DEFAULT_COMPARISON_LIMIT
}

impl ServerConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("wattcast").required(false))
            .add_source(config::Environment::with_prefix("WATTCAST").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// The schema variant declared in configuration.
    pub fn schema(&self) -> Result<FeatureSchema> {
        FeatureSchema::by_name(&self.model.schema)
            .with_context(|| format!("unknown schema variant `{}`", self.model.schema))
    }

    pub fn model_config(&self) -> Result<ModelConfig> {
        let source: ModelSource = self
            .model
            .source
            .parse()
            .with_context(|| format!("invalid model source `{}`", self.model.source))?;

        let mut config = ModelConfig::new(source);
        config.fetch_timeout = Duration::from_secs(self.model.fetch_timeout_secs);
        config.cache_dir = self.model.cache_dir.clone();
        config.expected_sha256 = self.model.sha256.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> ServerConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse("[model]\nsource = \"models/gbm.onnx\"\n");

        assert_eq!(config.port, 8080);
        assert_eq!(config.model.fetch_timeout_secs, 30);
        assert_eq!(config.model.schema, "full");
        assert!(config.history.csv_path.is_none());
        assert_eq!(config.history.comparison_limit, 1000);
    }

    #[test]
    fn test_schema_variant_resolution() {
        let config = parse("[model]\nsource = \"m.onnx\"\nschema = \"compact\"\n");
        assert_eq!(config.schema().unwrap().len(), 11);

        let config = parse("[model]\nsource = \"m.onnx\"\nschema = \"nope\"\n");
        assert!(config.schema().is_err());
    }

    #[test]
    fn test_model_config_from_url() {
        let config = parse(
            "[model]\nsource = \"https://models.example.com/gbm.onnx\"\nfetch_timeout_secs = 5\n",
        );
        let model_config = config.model_config().unwrap();

        assert!(matches!(model_config.source, ModelSource::RemoteUrl(_)));
        assert_eq!(model_config.fetch_timeout, Duration::from_secs(5));
    }
}
