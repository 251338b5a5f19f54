//! Cache backend trait and usage statistics.

use std::time::Duration;

use async_trait::async_trait;
use listkeep_core::ListkeepResult;

use super::key::CacheKey;

/// Cache backend trait for pluggable cache implementations.
///
/// A backend maps a [`CacheKey`] to one value plus an absolute expiration
/// instant. Implementations must support concurrent `try_get`/`set` with
/// per-key synchronization and must never hold a lock across an await.
///
/// # Expiration
///
/// Expiration is passive: an entry whose expiration instant has been reached
/// is reported as absent by `try_get`. Physically removing expired entries
/// (`purge_expired`) is memory hygiene only and must not change what
/// `try_get` returns.
#[async_trait]
pub trait CacheBackend<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Look up a live entry.
    async fn try_get(&self, key: &CacheKey) -> ListkeepResult<Option<V>>;

    /// Insert or replace the entry for `key`, expiring `ttl` from now.
    ///
    /// Last writer wins.
    async fn set(&self, key: CacheKey, value: V, ttl: Duration) -> ListkeepResult<()>;

    /// Remove every expired entry, returning how many were dropped.
    async fn purge_expired(&self) -> ListkeepResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> ListkeepResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, expired entries included.
    pub misses: u64,
    /// Number of entries physically present, expired or not.
    pub entry_count: u64,
    /// Number of `set` calls.
    pub writes: u64,
    /// Number of expired entries removed.
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
