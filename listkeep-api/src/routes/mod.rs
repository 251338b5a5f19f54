//! REST API Routes Module
//!
//! Assembles the per-entity routers into the complete application:
//! - `/api/todo/*` and `/api/product/*` behind user context resolution
//! - `/auth/token` when development tokens are enabled
//! - `/health/*` and `/metrics`, public

pub mod auth;
pub mod health;
pub mod product;
pub mod todo;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, request::Parts, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::middleware::user_context_middleware;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Build the CORS layer from the API configuration.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        // Matched per request so `*.domain` entries cover subdomains.
        let allowed = config.clone();
        let cors = cors.allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|o| allowed.is_origin_allowed(o))
                    .unwrap_or(false)
            },
        ));

        if config.cors_allow_credentials {
            cors.allow_credentials(true)
        } else {
            cors
        }
    }
}

/// Map a failure of the enclosing timeout stack into an API error.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("request exceeded the enclosing timeout");
        ApiError::timeout("request")
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        ApiError::internal_error("Unhandled middleware error")
    }
}

/// Create the complete API router.
///
/// Layer order, outermost first: CORS, request tracing, observability,
/// the enclosing timeout. The timeout drops the handler future when it
/// fires, which cancels any retrieval in flight.
pub fn create_api_router(state: AppState) -> Router {
    let api_config = state.api_config.clone();

    let api_routes = Router::new()
        .nest("/todo", todo::create_router())
        .nest("/product", product::create_router())
        .layer(middleware::from_fn_with_state(
            state.auth_config.clone(),
            user_context_middleware,
        ));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::create_router());

    if api_config.dev_tokens {
        tracing::warn!("Development token endpoint enabled at /auth/token");
        router = router.nest("/auth", auth::create_router());
    }

    router
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(api_config.request_timeout),
        )
        .layer(middleware::from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&api_config))
}
