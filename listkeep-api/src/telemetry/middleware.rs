//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in an `http_request` span and records Prometheus
//! request metrics against a normalized route.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::METRICS;

/// Numeric path segments, e.g. the `42` in `/api/todo/get/42`.
static ID_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

/// Boolean path segments, e.g. the `true` in `/api/product/sorting/true`.
static FLAG_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/(true|false)(/|$)").ok());

/// Normalize path for metrics/spans (replace ids and flags with placeholders).
///
/// This prevents high-cardinality label explosion in Prometheus.
fn normalize_path(path: &str) -> String {
    let mut result = path.to_string();
    if let Some(pattern) = ID_SEGMENT.as_ref() {
        // Applied twice so adjacent numeric segments both collapse.
        result = pattern.replace_all(&result, "/{id}$1").into_owned();
        result = pattern.replace_all(&result, "/{id}$1").into_owned();
    }
    if let Some(pattern) = FLAG_SEGMENT.as_ref() {
        result = pattern.replace_all(&result, "/{flag}$2").into_owned();
    }
    result
}

/// Observability middleware for Axum.
///
/// Every request gets a tracing span, a Prometheus counter and histogram
/// sample, and a completion log line.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "Request completed"
    );

    response
}
