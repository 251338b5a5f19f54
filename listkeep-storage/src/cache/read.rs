//! Result wrapper for single-item reads.

use tokio::time::Instant;

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// A live cache entry answered the read.
    Cache,
    /// The read missed, paid the recompute delay and populated the cache.
    Store,
}

/// Result of a single-item read, carrying its source.
///
/// Under user-keyed caching a hit may hold a different item than the one
/// requested; callers that care compare ids on the value.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
    read_at: Instant,
}

impl<T> CacheRead<T> {
    /// Create a new cache read from a cache hit.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
            read_at: Instant::now(),
        }
    }

    /// Create a new cache read from a storage fetch (cache miss).
    pub fn from_storage(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Store,
            read_at: Instant::now(),
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    /// When the read completed.
    pub fn read_at(&self) -> Instant {
        self.read_at
    }

    /// Check if this was a cache hit.
    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    /// Check if this was a cache miss (fetched from storage).
    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit()
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            source: self.source,
            read_at: self.read_at,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources() {
        let hit = CacheRead::from_cache(1u8);
        assert!(hit.was_cache_hit());
        assert_eq!(hit.source(), ReadSource::Cache);

        let miss = CacheRead::from_storage(1u8);
        assert!(miss.was_cache_miss());
        assert_eq!(miss.source(), ReadSource::Store);
    }

    #[test]
    fn test_map_keeps_source() {
        let read = CacheRead::from_cache(2u8).map(|v| v * 10);
        assert!(read.was_cache_hit());
        assert_eq!(read.into_value(), 20);
    }
}
