//! Listkeep Storage - Item Stores and Read-Through Cache
//!
//! Persistence and retrieval for listkeep items:
//!
//! - [`StoredItem`]: what the store needs to know about an item kind, and
//!   [`CachedItem`], the value type of the shared cache
//! - [`ItemStore`]: async persistence, with [`InMemoryItemStore`] as the
//!   shipped implementation
//! - [`cache`]: the TTL cache and the [`RetrievalOrchestrator`] that fronts
//!   single-item reads with it
//! - [`ListingService`]: uncached pagination

pub mod cache;
pub mod item;
pub mod listing;
pub mod store;

pub use cache::{
    CacheBackend, CacheKey, CacheRead, CacheStats, FixedLatency, InMemoryCacheBackend,
    NoLatency, ReadSource, RetrievalOrchestrator, SimulatedLatency,
};
pub use item::{CachedItem, StoredItem};
pub use listing::ListingService;
pub use store::{InMemoryItemStore, ItemStore};
