//! Listkeep API - REST Layer
//!
//! Axum HTTP surface for listkeep todo items and products. Single-item
//! reads go through the read-through cache of `listkeep-storage`; listing
//! and writes go to the item stores directly.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{AuthConfig, Claims, Credential, FixedClock, JwtClock, SigningSecret, SystemClock};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode, OPERATION_FAILED_MESSAGE};
pub use middleware::{user_context_middleware, CurrentUser, MaybeUser};
pub use routes::create_api_router;
pub use state::{AppState, ItemServices, ProductServices, SharedCache, TodoServices};
pub use types::*;
