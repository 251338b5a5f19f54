//! Read-through cache for single-item reads.
//!
//! # Layout
//!
//! - [`CacheBackend`]: pluggable key/value store with absolute per-entry
//!   expiration, implemented in-process by [`InMemoryCacheBackend`]
//! - [`CacheKey`]: keys derived from the acting user or the requested item,
//!   selected by [`CacheKeyMode`](listkeep_core::CacheKeyMode)
//! - [`SimulatedLatency`]: the recompute cost paid on every miss
//! - [`RetrievalOrchestrator`]: the only reader and writer of a cache
//!
//! One cache instance of [`CachedItem`](crate::CachedItem) values exists for
//! the life of the process and every item kind reads through it. Listing
//! never goes through the cache.
//!
//! # Example
//!
//! ```ignore
//! let cache = Arc::new(InMemoryCacheBackend::<CachedItem>::new());
//! let todos = RetrievalOrchestrator::new(todo_store, Arc::clone(&cache), config.clone());
//! let products = RetrievalOrchestrator::new(product_store, cache, config);
//!
//! match todos.get_item(id, &user, &token).await? {
//!     Some(read) if read.was_cache_hit() => { /* served without delay */ }
//!     Some(read) => { /* paid the recompute delay, now cached for the TTL */ }
//!     None => { /* not found, cache untouched */ }
//! }
//! ```

pub mod key;
pub mod latency;
pub mod memory;
pub mod read;
pub mod read_through;
pub mod traits;

pub use key::CacheKey;
pub use latency::{FixedLatency, NoLatency, SimulatedLatency};
pub use memory::InMemoryCacheBackend;
pub use read::{CacheRead, ReadSource};
pub use read_through::RetrievalOrchestrator;
pub use traits::{CacheBackend, CacheStats};
