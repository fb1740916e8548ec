//! Prediction engine

mod inference;

pub use inference::{GbmPredictor, InferenceStats};

use crate::error::PredictionError;
use crate::features::FeatureRecord;
use crate::schema::FeatureSchema;

/// Display precision for predictions surfaced to a user, in decimal places.
pub const DISPLAY_DECIMALS: usize = 3;

/// Format a prediction for display, in the model's native target unit (kW).
pub fn format_kw(value: f64) -> String {
    format!("{:.*}", DISPLAY_DECIMALS, value)
}

/// Trait for prediction implementations
pub trait PowerPredictor: Send + Sync {
    /// The schema this model was trained on.
    fn schema(&self) -> &FeatureSchema;

    /// Version identifier of the loaded model.
    fn model_version(&self) -> &str;

    /// Predict global active power (kW) for a single record.
    fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictionError>;

    /// Predict for a batch of records, one result per record, in input
    /// order. Batching never changes per-record output.
    fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, PredictionError> {
        records.iter().map(|r| self.predict(r)).collect()
    }
}

/// Fail fast when a record does not match the model's expected schema.
pub fn check_schema(expected: &FeatureSchema, record: &FeatureRecord) -> Result<(), PredictionError> {
    if record.schema_name() != expected.name() || record.len() != expected.len() {
        return Err(PredictionError::SchemaMismatch {
            expected: expected.name().to_string(),
            expected_len: expected.len(),
            actual: record.schema_name().to_string(),
            actual_len: record.len(),
        });
    }
    Ok(())
}
