//! Prometheus Metrics Definitions
//!
//! Defines all listkeep metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use listkeep_core::{ItemKind, ListkeepResult};
use listkeep_storage::CacheRead;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms to 10s; a cache miss pays several seconds.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<ListkeepMetrics>> = Lazy::new(ListkeepMetrics::new);

/// How a single-item read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    NotFound,
    Cancelled,
    Error,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::NotFound => "not_found",
            CacheOutcome::Cancelled => "cancelled",
            CacheOutcome::Error => "error",
        }
    }

    /// Classify the result of a retrieval.
    pub fn of<T>(result: &ListkeepResult<Option<CacheRead<T>>>) -> Self {
        match result {
            Ok(Some(read)) if read.was_cache_hit() => CacheOutcome::Hit,
            Ok(Some(_)) => CacheOutcome::Miss,
            Ok(None) => CacheOutcome::NotFound,
            Err(e) if e.is_cancelled() => CacheOutcome::Cancelled,
            Err(_) => CacheOutcome::Error,
        }
    }
}

/// Container for all listkeep metrics.
#[derive(Clone)]
pub struct ListkeepMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Single-item cache lookups - labels: kind, outcome
    pub cache_lookups_total: CounterVec,
}

impl ListkeepMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "listkeep_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register http_requests_total: {}", e))
            })?,

            http_request_duration_seconds: register_histogram_vec!(
                "listkeep_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e))
            })?,

            cache_lookups_total: register_counter_vec!(
                "listkeep_cache_lookups_total",
                "Single-item reads by item kind and cache outcome",
                &["kind", "outcome"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register cache_lookups_total: {}", e))
            })?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record the outcome of a single-item read.
    pub fn record_cache_lookup(&self, kind: ItemKind, outcome: CacheOutcome) {
        self.cache_lookups_total
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
    }
}

/// Record a cache outcome on the global registry, if it initialized.
pub fn record_cache_lookup(kind: ItemKind, outcome: CacheOutcome) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_cache_lookup(kind, outcome);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so the listkeep families exist on the first scrape.
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e, "metrics registry unavailable");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
