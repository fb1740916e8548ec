//! Error taxonomy for the prediction pipeline
//!
//! Three failure families cross the library boundary: model retrieval
//! (`LoadError`), feature assembly (`AssemblyError`) and inference
//! (`PredictionError`). Binaries render these at the edge instead of
//! crashing the session.

use std::path::PathBuf;
use thiserror::Error;

/// Model retrieval or deserialization failure.
///
/// Non-fatal to the process; prediction stays unavailable until the
/// model is explicitly reloaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read model file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model fetch from {url} failed")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model fetch from {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to deserialize model: {0}")]
    Decode(String),

    #[error("failed to persist model to cache")]
    Cache(#[source] std::io::Error),

    #[error("no model source configured")]
    NotConfigured,
}

/// Feature assembly failure for inputs arriving from an unconstrained
/// source. Bounded UI controls never trigger these.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` value {value} is outside its domain {min}..={max}")]
    OutOfDomain {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("field `{field}` must be an integer, got {value}")]
    NotAnInteger { field: &'static str, value: f64 },

    #[error("field `{0}` is derived and cannot be supplied directly")]
    DerivedFieldSupplied(&'static str),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("field `{field}` is not part of schema `{schema}`")]
    NotInSchema { field: &'static str, schema: String },
}

impl AssemblyError {
    /// The field name the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            AssemblyError::MissingField(f)
            | AssemblyError::DerivedFieldSupplied(f)
            | AssemblyError::OutOfDomain { field: f, .. }
            | AssemblyError::NotAnInteger { field: f, .. }
            | AssemblyError::NotInSchema { field: f, .. } => Some(f),
            AssemblyError::UnknownField(f) => Some(f),
        }
    }
}

/// Inference failure.
///
/// A schema mismatch is a programming error: records must never be
/// silently coerced into a differently-shaped model input.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(
        "feature record uses schema `{actual}` ({actual_len} fields), \
         model expects `{expected}` ({expected_len} fields)"
    )]
    SchemaMismatch {
        expected: String,
        expected_len: usize,
        actual: String,
        actual_len: usize,
    },

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}
