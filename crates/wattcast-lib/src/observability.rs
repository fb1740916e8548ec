//! Observability infrastructure
//!
//! Prometheus metrics for the prediction service: inference latency,
//! prediction and load error counters, and loaded-model info.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    model_load_errors_total: IntCounter,
    model_info: GaugeVec,
    history_rows: IntGauge,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "wattcast_inference_latency_seconds",
                "Time spent running model inference per prediction request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_counter!(
                "wattcast_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "wattcast_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            model_load_errors_total: register_int_counter!(
                "wattcast_model_load_errors_total",
                "Total number of failed model load attempts"
            )
            .expect("Failed to register model_load_errors_total"),

            model_info: register_gauge_vec!(
                "wattcast_model_info",
                "Information about the currently loaded model",
                &["version", "schema"]
            )
            .expect("Failed to register model_info"),

            history_rows: register_int_gauge!(
                "wattcast_history_rows",
                "Number of rows in the loaded historical sample"
            )
            .expect("Failed to register history_rows"),
        }
    }
}

/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn inc_model_load_errors(&self) {
        self.inner().model_load_errors_total.inc();
    }

    /// Replace the exported model info labels with the current model.
    pub fn set_model_info(&self, version: &str, schema: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, schema])
            .set(1.0);
    }

    pub fn set_history_rows(&self, rows: i64) {
        self.inner().history_rows.set(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_records_without_panic() {
        let metrics = ServiceMetrics::new();

        metrics.observe_inference_latency(0.002);
        metrics.inc_predictions();
        metrics.inc_prediction_errors();
        metrics.inc_model_load_errors();
        metrics.set_model_info("sha256:abc123", "full");
        metrics.set_history_rows(1000);
    }
}
