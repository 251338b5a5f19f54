//! Read-through retrieval of single items.
//!
//! The orchestrator is the only component that reads or writes the cache.
//! A read first asks the store whether the item exists, then consults the
//! cache under a key derived from
//! [`CacheKeyMode`](listkeep_core::CacheKeyMode), and on a miss pays the
//! simulated recompute delay before storing the store's answer.
//!
//! Orchestrators of every item kind share one cache of [`CachedItem`]
//! values. An entry holding another kind than the one requested is treated
//! as a miss and overwritten.

use std::marker::PhantomData;
use std::sync::Arc;

use listkeep_core::{ItemId, ListkeepResult, RetrievalConfig, RetrievalError, UserInfo};
use tokio_util::sync::CancellationToken;

use super::key::CacheKey;
use super::latency::{FixedLatency, SimulatedLatency};
use super::read::CacheRead;
use super::traits::CacheBackend;
use crate::item::{CachedItem, StoredItem};
use crate::store::ItemStore;

/// Single-item retrieval over a store and a read-through cache.
///
/// # Type Parameters
///
/// - `T`: the item kind served
/// - `S`: the item store consulted for existence and the fresh value
/// - `C`: the cache backend, shared by every kind for the process lifetime
///
/// # Cancellation
///
/// Every read takes a [`CancellationToken`]. The store call and the
/// recompute delay race against it, and the cache `set` is skipped once it
/// fires, so a cancelled read leaves the cache untouched. Dropping the
/// returned future has the same effect.
///
/// # Example
///
/// ```ignore
/// let orchestrator = RetrievalOrchestrator::new(store, cache, RetrievalConfig::default());
/// let read = orchestrator.get_item(id, &user, &CancellationToken::new()).await?;
/// ```
pub struct RetrievalOrchestrator<T, S, C>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
    C: CacheBackend<CachedItem>,
{
    store: Arc<S>,
    cache: Arc<C>,
    latency: Arc<dyn SimulatedLatency>,
    config: RetrievalConfig,
    _item: PhantomData<fn() -> T>,
}

impl<T, S, C> RetrievalOrchestrator<T, S, C>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
    C: CacheBackend<CachedItem>,
{
    /// Create an orchestrator whose miss delay is `config.recompute_delay`.
    pub fn new(store: Arc<S>, cache: Arc<C>, config: RetrievalConfig) -> Self {
        let latency: Arc<dyn SimulatedLatency> =
            Arc::new(FixedLatency::new(config.recompute_delay));
        Self {
            store,
            cache,
            latency,
            config,
            _item: PhantomData,
        }
    }

    /// Replace the recompute cost model.
    pub fn with_latency(mut self, latency: Arc<dyn SimulatedLatency>) -> Self {
        self.latency = latency;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Read one item for `user`.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` when the store has no item `id`; the cache is not touched
    /// - `Ok(Some(read))` with `read.was_cache_hit()` when a live entry of
    ///   kind `T` exists under the derived key. Under
    ///   [`CacheKeyMode::ByUser`](listkeep_core::CacheKeyMode::ByUser) that
    ///   entry may hold a different item than `id`.
    /// - `Ok(Some(read))` from storage otherwise, after the recompute delay and
    ///   a `set` with the configured TTL
    /// - `Err(RetrievalError::Cancelled)` when `cancel` fired first
    pub async fn get_item(
        &self,
        id: ItemId,
        user: &UserInfo,
        cancel: &CancellationToken,
    ) -> ListkeepResult<Option<CacheRead<T>>> {
        let kind = T::kind();
        let cancelled = || RetrievalError::Cancelled { kind, id };

        let stored = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled().into()),
            result = self.store.get_by_id(id) => result?,
        };

        let Some(item) = stored else {
            tracing::debug!(kind = %kind, id = %id, "item not found, cache skipped");
            return Ok(None);
        };

        let key = CacheKey::for_read(self.config.key_mode, kind, user, id);

        if let Some(cached) = self.cache.try_get(&key).await? {
            let held = cached.kind();
            match T::from_cached(cached) {
                Some(cached) => {
                    tracing::debug!(
                        kind = %kind,
                        id = %id,
                        cached_id = %cached.item_id(),
                        key = %key,
                        "cache hit"
                    );
                    return Ok(Some(CacheRead::from_cache(cached)));
                }
                None => tracing::debug!(
                    kind = %kind,
                    id = %id,
                    held = %held,
                    key = %key,
                    "cache slot holds another kind, treating as miss"
                ),
            }
        }

        let delay = self.latency.delay_for(kind);
        tracing::debug!(
            kind = %kind,
            id = %id,
            key = %key,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "cache miss, recomputing"
        );

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(kind = %kind, id = %id, "retrieval cancelled during recompute");
                    return Err(cancelled().into());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!(kind = %kind, id = %id, "retrieval cancelled before cache set");
            return Err(cancelled().into());
        }

        self.cache
            .set(key, item.clone().into_cached(), self.config.cache_ttl)
            .await?;

        Ok(Some(CacheRead::from_storage(item)))
    }
}

impl<T, S, C> Clone for RetrievalOrchestrator<T, S, C>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
    C: CacheBackend<CachedItem>,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            latency: Arc::clone(&self.latency),
            config: self.config.clone(),
            _item: PhantomData,
        }
    }
}

impl<T, S, C> std::fmt::Debug for RetrievalOrchestrator<T, S, C>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
    C: CacheBackend<CachedItem>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("kind", &T::kind())
            .field("latency", &self.latency)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
