//! ONNX inference using tract
//!
//! Runs the serialized gradient-boosted regressor via tract-onnx with a
//! fixed `[1, N]` input plan. Batch prediction is an ordered sequence of
//! single-record runs over the same plan, so batching cannot change
//! per-record results.

use super::{check_schema, PowerPredictor};
use crate::error::{LoadError, PredictionError};
use crate::features::FeatureRecord;
use crate::schema::FeatureSchema;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above this threshold is logged as slow.
const MAX_INFERENCE_MS: u128 = 5;

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Gradient-boosted regression model loaded for inference.
///
/// Immutable after construction; replacing the model is done by loading a
/// new instance, never by mutating this one.
pub struct GbmPredictor {
    plan: TractPlan,
    schema: FeatureSchema,
    version: String,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl GbmPredictor {
    /// Parse and optimize a serialized ONNX model for the given schema.
    pub fn from_bytes(
        bytes: &[u8],
        schema: FeatureSchema,
        version: impl Into<String>,
    ) -> Result<Self, LoadError> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .map_err(|e| LoadError::Decode(format!("failed to parse ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, schema.len()]).into())
            .map_err(|e| LoadError::Decode(format!("failed to set input shape: {e}")))?
            .into_optimized()
            .map_err(|e| LoadError::Decode(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| LoadError::Decode(format!("failed to create runnable model: {e}")))?;

        Ok(Self {
            plan,
            schema,
            version: version.into(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    fn record_to_tensor(&self, record: &FeatureRecord) -> Result<Tensor, PredictionError> {
        let data = record.to_model_input();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.schema.len()), data)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        Ok(array.into())
    }

    fn scalar_from_output(&self, output: &Tensor) -> Result<f64, PredictionError> {
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        let value = view
            .iter()
            .next()
            .ok_or_else(|| PredictionError::Inference("model produced no output".to_string()))?;
        Ok(*value as f64)
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl PowerPredictor for GbmPredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn model_version(&self) -> &str {
        &self.version
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictionError> {
        check_schema(&self.schema, record)?;

        let start = Instant::now();
        let input = self.record_to_tensor(record)?;
        let result = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        let output = result
            .first()
            .ok_or_else(|| PredictionError::Inference("no output from model".to_string()))?;
        let prediction = self.scalar_from_output(output)?;

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "inference completed");
        }

        Ok(prediction)
    }
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = GbmPredictor::from_bytes(b"definitely not onnx", FeatureSchema::full(), "v1");
        match err {
            Err(LoadError::Decode(message)) => {
                assert!(message.contains("parse"), "message was: {message}")
            }
            other => panic!("expected Decode error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_bytes_fail_to_decode() {
        assert!(matches!(
            GbmPredictor::from_bytes(&[], FeatureSchema::compact(), "v1"),
            Err(LoadError::Decode(_))
        ));
    }
}
