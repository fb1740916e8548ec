//! HTTP API for predictions, chart data, model management and health

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use wattcast_lib::{
    format_kw, AssemblyError, ComparisonPoint, FeatureAssembler, HistoricalSample, HistogramBin,
    HistoryError, HourlyMean, LoadError, ModelHandle, ModelInfo, PredictionError, RawReading,
    ServiceMetrics,
};

/// Shared application state
pub struct AppState {
    pub model: ModelHandle,
    pub assembler: FeatureAssembler,
    pub history: Option<Arc<HistoricalSample>>,
    pub comparison_limit: usize,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(
        model: ModelHandle,
        assembler: FeatureAssembler,
        history: Option<Arc<HistoricalSample>>,
        comparison_limit: usize,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            model,
            assembler,
            history,
            comparison_limit,
            metrics,
        }
    }
}

/// Error rendered to the caller instead of crashing the session.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field: None,
        }
    }

    fn history_not_configured() -> Self {
        Self::new(StatusCode::NOT_FOUND, "historical sample not configured")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            field: self.field,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AssemblyError> for ApiError {
    fn from(e: AssemblyError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            field: e.field().map(str::to_string),
            message: e.to_string(),
        }
    }
}

impl From<LoadError> for ApiError {
    // a load failure is terminal for the session until explicitly retried
    fn from(e: LoadError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        match e {
            PredictionError::Load(load) => load.into(),
            // schema mismatch is a programming error, not caller input
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::Assembly(inner) => inner.into(),
            HistoryError::Prediction(inner) => inner.into(),
            HistoryError::Csv(inner) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, inner.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted global active power in kW
    pub prediction_kw: f64,
    /// Prediction at display precision
    pub display: String,
    pub model_version: String,
    pub schema: String,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(reading): Json<RawReading>,
) -> Result<Json<PredictResponse>, ApiError> {
    let record = state.assembler.assemble(&reading)?;

    let model = state.model.get().await.map_err(|e| {
        state.metrics.inc_model_load_errors();
        ApiError::from(e)
    })?;

    let start = Instant::now();
    let prediction = model.predictor.predict(&record).map_err(|e| {
        state.metrics.inc_prediction_errors();
        ApiError::from(e)
    })?;
    state
        .metrics
        .observe_inference_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_predictions();

    info!(
        prediction_kw = prediction,
        model_version = %model.info.version,
        "prediction served"
    );

    Ok(Json(PredictResponse {
        prediction_kw: prediction,
        display: format_kw(prediction),
        model_version: model.info.version.clone(),
        schema: record.schema_name().to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: wattcast_lib::FieldKind,
    pub min: f64,
    pub max: f64,
    pub integer: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

/// Active schema with per-field domains, for building bounded input controls.
async fn schema(State(state): State<Arc<AppState>>) -> Json<SchemaResponse> {
    let schema = state.assembler.schema();
    let fields = schema
        .fields()
        .iter()
        .map(|f| {
            let domain = f.domain();
            FieldSpec {
                name: f.name().to_string(),
                kind: f.kind(),
                min: domain.min,
                max: domain.max,
                integer: domain.integer,
            }
        })
        .collect();

    Json(SchemaResponse {
        name: schema.name().to_string(),
        fields,
    })
}

async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<ModelInfo>, ApiError> {
    let model = state.model.get().await.map_err(|e| {
        state.metrics.inc_model_load_errors();
        ApiError::from(e)
    })?;
    state
        .metrics
        .set_model_info(&model.info.version, &model.info.schema);
    Ok(Json(model.info))
}

async fn model_reload(State(state): State<Arc<AppState>>) -> Result<Json<ModelInfo>, ApiError> {
    let model = state.model.reload().await.map_err(|e| {
        state.metrics.inc_model_load_errors();
        ApiError::from(e)
    })?;
    state
        .metrics
        .set_model_info(&model.info.version, &model.info.schema);
    info!(version = %model.info.version, "model reloaded");
    Ok(Json(model.info))
}

#[derive(Debug, Deserialize)]
struct ComparisonParams {
    limit: Option<usize>,
}

async fn history_comparison(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<Vec<ComparisonPoint>>, ApiError> {
    let sample = state
        .history
        .as_ref()
        .ok_or_else(ApiError::history_not_configured)?;
    let model = state.model.get().await?;

    let limit = params.limit.unwrap_or(state.comparison_limit);
    let points = sample.comparison(model.predictor.as_ref(), &state.assembler, limit)?;
    Ok(Json(points))
}

async fn history_hourly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HourlyMean>>, ApiError> {
    let sample = state
        .history
        .as_ref()
        .ok_or_else(ApiError::history_not_configured)?;
    let model = state.model.get().await?;

    let hourly = sample.mean_by_hour(model.predictor.as_ref(), &state.assembler)?;
    Ok(Json(hourly))
}

#[derive(Debug, Deserialize)]
struct HistogramParams {
    bins: Option<usize>,
}

const DEFAULT_HISTOGRAM_BINS: usize = 30;

async fn history_histogram(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistogramParams>,
) -> Result<Json<Vec<HistogramBin>>, ApiError> {
    let sample = state
        .history
        .as_ref()
        .ok_or_else(ApiError::history_not_configured)?;

    let bins = params.bins.unwrap_or(DEFAULT_HISTOGRAM_BINS);
    Ok(Json(sample.histogram(bins)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Health check - the service is degraded, not broken, while the model has
/// not been loaded yet.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut components = BTreeMap::new();

    let model_health = match state.model.current().await {
        Some(model) => ComponentHealth {
            status: "healthy".to_string(),
            message: Some(format!("model {} loaded", model.info.version)),
        },
        None => ComponentHealth {
            status: "degraded".to_string(),
            message: Some("model not loaded yet".to_string()),
        },
    };
    let history_health = match &state.history {
        Some(sample) => ComponentHealth {
            status: "healthy".to_string(),
            message: Some(format!("{} rows", sample.len())),
        },
        None => ComponentHealth {
            status: "degraded".to_string(),
            message: Some("historical sample not configured".to_string()),
        },
    };

    let status = if model_health.status == "healthy" && history_health.status == "healthy" {
        "healthy"
    } else {
        "degraded"
    };
    components.insert("model".to_string(), model_health);
    components.insert("history".to_string(), history_health);

    // degraded is still operational
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            components,
        }),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub model_loaded: bool,
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.model.current().await.is_some();
    (
        StatusCode::OK,
        Json(ReadinessResponse {
            ready: true,
            model_loaded,
        }),
    )
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/schema", get(schema))
        .route("/api/v1/model", get(model_info))
        .route("/api/v1/model/reload", post(model_reload))
        .route("/api/v1/history/comparison", get(history_comparison))
        .route("/api/v1/history/hourly", get(history_hourly))
        .route("/api/v1/history/histogram", get(history_histogram))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
