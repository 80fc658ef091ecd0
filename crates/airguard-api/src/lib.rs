use std::sync::Arc;

use airguard_core::{history, resolve, CityKey, CoreError, DatasetStore, Forecaster, Prediction};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::json;

const MODEL_VERSION: &str = "CSV-based v1.0";

/// Shared, read-only state behind every handler
pub struct AppState {
    store: DatasetStore,
    forecaster: Forecaster,
    history_window: usize,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
}

impl AppState {
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    fn count(&self, route: &'static str) {
        self.requests_total.add(1, &[KeyValue::new("route", route)]);
    }
}

pub fn build_app(
    store: DatasetStore,
    forecaster: Forecaster,
    history_window: usize,
) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter().with_registry(registry.clone()).build()?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("airguard-api");

    let requests_total = meter
        .u64_counter("airguard_requests_total")
        .with_description("Total HTTP requests served")
        .init();

    let state = Arc::new(AppState {
        store,
        forecaster,
        history_window,
        registry,
        provider,
        requests_total,
    });

    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/predict/:city", get(predict))
        .route("/api/data/:city", get(city_data))
        .route("/api/cities", get(cities))
        .route("/api/debug", get(debug_info))
        .route("/metrics", get(metrics))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

/// Error body `{"error": ...}` with a route-specific status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// `no_data` is the status a missing dataset maps to on this route
    fn from_core(err: CoreError, no_data: StatusCode) -> Self {
        let status = match &err {
            CoreError::UnsupportedCity(_) => StatusCode::BAD_REQUEST,
            CoreError::NoDataAvailable(_) => no_data,
            CoreError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &err {
            CoreError::UnsupportedCity(city) => tracing::warn!(%city, "unsupported city"),
            CoreError::NoDataAvailable(city) => tracing::warn!(%city, "no data available"),
            CoreError::Processing(msg) => tracing::error!(error = %msg, "processing failed"),
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("health");
    Json(json!({
        "status": "ok",
        "message": "API is running",
        "model_version": MODEL_VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data_sources": state.store.cities(),
        "data_loaded": state.store.counts(),
    }))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<Json<Prediction>, ApiError> {
    state.count("predict");
    let key = resolve(&city).map_err(|e| ApiError::from_core(e, StatusCode::INTERNAL_SERVER_ERROR))?;
    let prediction = state
        .forecaster
        .forecast(&state.store, key)
        .map_err(|e| ApiError::from_core(e, StatusCode::INTERNAL_SERVER_ERROR))?;
    Ok(Json(prediction))
}

async fn city_data(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.count("data");
    let key = resolve(&city).map_err(|e| ApiError::from_core(e, StatusCode::NOT_FOUND))?;
    let points = history(&state.store, key, state.history_window)
        .map_err(|e| ApiError::from_core(e, StatusCode::NOT_FOUND))?;
    Ok(Json(points))
}

async fn cities(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("cities");
    Json(json!({
        "cities": state.store.cities(),
        "available_data": state.store.cities_with_data(),
    }))
}

async fn debug_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("debug");
    let sample = state
        .store
        .records(CityKey::Cdmx)
        .map(|records| &records[..records.len().min(2)])
        .unwrap_or_default();
    Json(json!({
        "status": "debug",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data_counts": state.store.counts(),
        "forecast_timestamp_policy": state.forecaster.policy(),
        "history_window": state.history_window,
        "sample_data": sample,
    }))
}

/// Prometheus text exposition of the request counters
async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    state.count("metrics");
    let encoder = TextEncoder::new();
    let body = encoder
        .encode_to_string(&state.registry.gather())
        .map_err(|e| {
            tracing::error!(error = %e, "failed to encode metrics");
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "failed to encode metrics".to_string(),
            }
        })?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body).into_response())
}
