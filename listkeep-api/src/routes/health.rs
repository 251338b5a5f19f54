//! Unauthenticated health checks under `/health`.
//!
//! `ping` and `live` only prove the process answers. `ready` asks each item
//! store for its size and reports how many entries the shared cache holds;
//! any store failure turns the whole response into a 503.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use listkeep_storage::StoredItem;
use serde::{Deserialize, Serialize};

use crate::state::{AppState, ItemServices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn all<'a>(parts: impl IntoIterator<Item = &'a ComponentHealth>) -> Self {
        if parts.into_iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    fn http_status(self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ReadinessDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessDetails {
    pub todos: ComponentHealth,
    pub products: ComponentHealth,
    /// Entries physically held by the shared cache, expired or not.
    pub cache_entries: usize,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Store state for one item kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    async fn check<T: StoredItem>(services: &ItemServices<T>) -> Self {
        match services.store.count().await {
            Ok(count) => Self {
                status: HealthStatus::Healthy,
                item_count: Some(count),
                error: None,
            },
            Err(e) => {
                tracing::warn!(kind = %T::kind(), error = %e, "readiness check failed");
                Self {
                    status: HealthStatus::Unhealthy,
                    item_count: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// GET /health/ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    })
}

/// GET /health/ready
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let todos = ComponentHealth::check(&state.todos).await;
    let products = ComponentHealth::check(&state.products).await;
    let status = HealthStatus::all([&todos, &products]);

    let body = HealthResponse {
        status,
        message: None,
        details: Some(ReadinessDetails {
            todos,
            products,
            cache_entries: state.cache.len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };
    (status.http_status(), Json(body))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
