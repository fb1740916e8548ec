//! Model retrieval, validation and process-wide caching
//!
//! Replaces hard-coded artifact URLs and ad-hoc temp files with an explicit
//! source configuration. The loaded model is held as lazily-initialized,
//! immutable shared state: loaded at most once per process, reused across
//! predictions, replaced only through the explicit `reload` entry point.

use crate::error::LoadError;
use crate::predictor::{GbmPredictor, PowerPredictor};
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

/// Default bound on remote artifact retrieval.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the serialized model artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    LocalPath(PathBuf),
    RemoteUrl(Url),
}

impl FromStr for ModelSource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(ModelSource::RemoteUrl(Url::parse(s)?))
        } else {
            Ok(ModelSource::LocalPath(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::LocalPath(path) => write!(f, "{}", path.display()),
            ModelSource::RemoteUrl(url) => write!(f, "{}", url),
        }
    }
}

/// Configuration for model retrieval
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Artifact location, local or remote
    pub source: ModelSource,
    /// Bound on the remote fetch; the fetch fails rather than hang
    pub fetch_timeout: Duration,
    /// Directory where remotely fetched artifacts are kept
    pub cache_dir: PathBuf,
    /// Optional integrity check of the artifact bytes
    pub expected_sha256: Option<String>,
}

impl ModelConfig {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache_dir: std::env::temp_dir().join("wattcast-models"),
            expected_sha256: None,
        }
    }
}

/// Metadata of the currently loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: String,
    pub source: String,
    pub checksum: String,
    pub size_bytes: usize,
    pub schema: String,
    pub loaded_at: i64,
}

/// A loaded model together with its metadata. Cheap to clone and share.
#[derive(Clone)]
pub struct CachedModel {
    pub predictor: Arc<dyn PowerPredictor>,
    pub info: ModelInfo,
}

impl std::fmt::Debug for CachedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedModel")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Retrieves and deserializes model artifacts
pub struct ModelLoader {
    config: ModelConfig,
}

impl ModelLoader {
    /// Create a new loader, ensuring the artifact cache directory exists.
    pub fn new(config: ModelConfig) -> Result<Self, LoadError> {
        fs::create_dir_all(&config.cache_dir).map_err(LoadError::Cache)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Retrieve, validate and deserialize the configured artifact.
    ///
    /// Remote artifacts are persisted into the cache directory only after
    /// checksum validation and deserialization both succeed; a failed load
    /// leaves no partial artifact behind.
    pub async fn load(&self, schema: FeatureSchema) -> Result<CachedModel, LoadError> {
        let bytes = match &self.config.source {
            ModelSource::LocalPath(path) => fs::read(path).map_err(|e| LoadError::Io {
                path: path.clone(),
                source: e,
            })?,
            ModelSource::RemoteUrl(url) => self.fetch(url).await?,
        };

        let checksum = compute_checksum(&bytes);
        if let Some(expected) = &self.config.expected_sha256 {
            if !expected.eq_ignore_ascii_case(&checksum) {
                return Err(LoadError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual: checksum,
                });
            }
        }

        let version = format!("sha256:{}", &checksum[..12]);
        let predictor = GbmPredictor::from_bytes(&bytes, schema, &version)?;

        if matches!(self.config.source, ModelSource::RemoteUrl(_)) {
            self.persist_artifact(&version, &bytes)?;
        }

        info!(
            version = %version,
            source = %self.config.source,
            size = bytes.len(),
            "model loaded"
        );

        Ok(CachedModel {
            info: ModelInfo {
                version,
                source: self.config.source.to_string(),
                checksum,
                size_bytes: bytes.len(),
                schema: predictor.schema().name().to_string(),
                loaded_at: chrono::Utc::now().timestamp(),
            },
            predictor: Arc::new(predictor),
        })
    }

    /// Fetch artifact bytes over HTTP(S) with a bounded timeout.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(self.config.fetch_timeout)
            .build()
            .map_err(|e| LoadError::Fetch {
                url: url.to_string(),
                source: e,
            })?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::Fetch {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| LoadError::Fetch {
            url: url.to_string(),
            source: e,
        })?;

        Ok(bytes.to_vec())
    }

    /// Persist artifact bytes atomically: write to a temp file, then rename.
    fn persist_artifact(&self, version: &str, bytes: &[u8]) -> Result<(), LoadError> {
        let name = version.replace(':', "_");
        let path = self.config.cache_dir.join(format!("model_{}.onnx", name));
        let temp_path = path.with_extension("tmp");

        let write = (|| -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()
        })();

        if let Err(e) = write {
            let _ = fs::remove_file(&temp_path);
            return Err(LoadError::Cache(e));
        }

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LoadError::Cache(e)
        })?;

        Ok(())
    }
}

/// Process-wide cached model with an explicit reload entry point.
pub struct ModelHandle {
    loader: Option<ModelLoader>,
    schema: FeatureSchema,
    slot: RwLock<Option<CachedModel>>,
}

impl ModelHandle {
    pub fn new(loader: ModelLoader, schema: FeatureSchema) -> Self {
        Self {
            loader: Some(loader),
            schema,
            slot: RwLock::new(None),
        }
    }

    /// A handle already holding a model, bypassing retrieval.
    pub fn preloaded(predictor: Arc<dyn PowerPredictor>, info: ModelInfo) -> Self {
        let schema = predictor.schema().clone();
        Self {
            loader: None,
            schema,
            slot: RwLock::new(Some(CachedModel { predictor, info })),
        }
    }

    /// Get the cached model, loading it on first use.
    ///
    /// Concurrent callers during the first load are serialized on the
    /// write lock; the artifact is fetched at most once.
    pub async fn get(&self) -> Result<CachedModel, LoadError> {
        if let Some(model) = self.slot.read().await.as_ref() {
            return Ok(model.clone());
        }

        let mut slot = self.slot.write().await;
        if let Some(model) = slot.as_ref() {
            // another caller won the race
            return Ok(model.clone());
        }

        let loaded = self.load_fresh().await?;
        *slot = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drop the cached model and load the artifact again.
    ///
    /// The previous model keeps serving readers that already cloned it;
    /// failure leaves the cache empty so the next `get` retries.
    pub async fn reload(&self) -> Result<CachedModel, LoadError> {
        let mut slot = self.slot.write().await;
        slot.take();
        match self.load_fresh().await {
            Ok(loaded) => {
                *slot = Some(loaded.clone());
                Ok(loaded)
            }
            Err(e) => {
                warn!(error = %e, "model reload failed, prediction unavailable until retried");
                Err(e)
            }
        }
    }

    /// The currently cached model, if one has been loaded.
    pub async fn current(&self) -> Option<CachedModel> {
        self.slot.read().await.clone()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    async fn load_fresh(&self) -> Result<CachedModel, LoadError> {
        let loader = self.loader.as_ref().ok_or(LoadError::NotConfigured)?;
        loader.load(self.schema.clone()).await
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
