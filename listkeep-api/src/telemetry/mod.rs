//! Listkeep Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing-subscriber` and Prometheus metrics
//! for the API layer. Nothing here needs an external collector.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, CacheOutcome, ListkeepMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
