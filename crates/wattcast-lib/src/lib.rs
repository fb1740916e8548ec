//! Core library for household power-consumption prediction
//!
//! This crate provides:
//! - Feature schema catalog and ordered assembly of model inputs
//! - ONNX model retrieval with cache-on-first-load semantics
//! - Prediction with fail-fast schema checking
//! - Historical actual-vs-predicted reporting series
//! - Metrics and typed error taxonomy

pub mod error;
pub mod features;
pub mod history;
pub mod model;
pub mod observability;
pub mod predictor;
pub mod schema;

pub use error::{AssemblyError, LoadError, PredictionError};
pub use features::{FeatureAssembler, FeatureRecord, RawReading};
pub use history::{
    ComparisonPoint, HistoricalSample, HistogramBin, HistoryError, HourlyMean,
    DEFAULT_COMPARISON_LIMIT,
};
pub use model::{
    CachedModel, ModelConfig, ModelHandle, ModelInfo, ModelLoader, ModelSource,
    DEFAULT_FETCH_TIMEOUT,
};
pub use observability::ServiceMetrics;
pub use predictor::{format_kw, GbmPredictor, PowerPredictor, DISPLAY_DECIMALS};
pub use schema::{Domain, FeatureField, FeatureSchema, FieldKind};
