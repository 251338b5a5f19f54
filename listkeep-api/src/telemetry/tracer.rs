//! Tracing Subscriber Initialization
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` plus either a
//! JSON or a human-readable fmt layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "listkeep_api=debug,listkeep_storage=debug,tower_http=debug,info";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Emit JSON lines instead of pretty text
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("LISTKEEP_SERVICE_NAME")
                .unwrap_or_else(|_| "listkeep-api".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: std::env::var("LISTKEEP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            json_logs: std::env::var("LISTKEEP_LOG_FORMAT")
                .map(|s| s != "pretty")
                .unwrap_or(true),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at startup before any tracing occurs. A second call fails
/// because the global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init tracing: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}
