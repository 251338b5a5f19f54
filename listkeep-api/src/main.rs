//! Listkeep API Server Entry Point
//!
//! Loads configuration from the environment, wires the stores and caches,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;

use axum::Router;
use listkeep_api::telemetry::{init_tracing, TelemetryConfig};
use listkeep_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig};
use listkeep_core::RetrievalConfig;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let retrieval_config = RetrievalConfig::from_env().map_err(|e| {
        ApiError::invalid_input(format!("Invalid retrieval configuration: {}", e))
    })?;
    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.warn_if_insecure();

    tracing::info!(
        cache_ttl_secs = retrieval_config.cache_ttl.as_secs(),
        recompute_delay_ms =
            u64::try_from(retrieval_config.recompute_delay.as_millis()).unwrap_or(u64::MAX),
        key_mode = retrieval_config.key_mode.as_str(),
        "Retrieval configured"
    );

    let state = AppState::in_memory(retrieval_config.clone(), api_config, auth_config);

    let shutdown = CancellationToken::new();
    let sweeper = retrieval_config.sweep_interval.map(|every| {
        tracing::info!(interval_secs = every.as_secs(), "Cache sweeper started");
        state.cache.spawn_sweeper(every, shutdown.clone())
    });

    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting listkeep API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "cache sweeper ended abnormally");
        }
    }
    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("LISTKEEP_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("LISTKEEP_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
