//! In-process TTL cache backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use listkeep_core::ListkeepResult;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats};

/// One cached value and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// DashMap-backed cache with absolute per-entry expiration.
///
/// Shards give per-key synchronization; no shard guard is ever held across
/// an await. Expiration uses `tokio::time::Instant`, so paused-clock tests
/// drive it deterministically.
#[derive(Debug)]
pub struct InMemoryCacheBackend<V> {
    entries: DashMap<CacheKey, CacheEntry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    expirations: AtomicU64,
}

impl<V> Default for InMemoryCacheBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryCacheBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Number of entries physically present, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a background task that purges expired entries every `every`.
    ///
    /// Purging never changes what `try_get` returns. The task stops when
    /// `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        match cache.purge_expired().await {
                            Ok(0) => {}
                            Ok(removed) => tracing::debug!(removed, "purged expired cache entries"),
                            Err(e) => tracing::warn!(error = %e, "cache sweep failed"),
                        }
                    }
                }
            }
            tracing::debug!("cache sweeper stopped");
        })
    }
}

#[async_trait]
impl<V> CacheBackend<V> for InMemoryCacheBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn try_get(&self, key: &CacheKey) -> ListkeepResult<Option<V>> {
        let now = Instant::now();

        // Clone out and release the shard guard before any removal.
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));

        match lookup {
            Some((true, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            Some((false, _)) => {
                // A concurrent set may have refreshed the entry since the read.
                if self
                    .entries
                    .remove_if(key, |_, entry| !entry.is_live(now))
                    .is_some()
                {
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: CacheKey, value: V, ttl: Duration) -> ListkeepResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key, entry);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn purge_expired(&self) -> ListkeepResult<u64> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len()) as u64;
        self.expirations.fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    async fn stats(&self) -> ListkeepResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            writes: self.writes.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        })
    }
}
