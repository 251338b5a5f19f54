//! Configuration types for the single-item retrieval path.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How the read-through cache derives its key for a single-item read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyMode {
    /// Key by the acting user's id. A user holds at most one cached item at a
    /// time, so a read of a different item inside the TTL returns the item
    /// cached first.
    #[default]
    ByUser,
    /// Key by the requested item's id.
    ByItemId,
}

impl CacheKeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKeyMode::ByUser => "by_user",
            CacheKeyMode::ByItemId => "by_item_id",
        }
    }
}

impl FromStr for CacheKeyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "by_user" | "byuser" | "user" => Ok(CacheKeyMode::ByUser),
            "by_item_id" | "byitemid" | "item" => Ok(CacheKeyMode::ByItemId),
            other => Err(ConfigError::InvalidValue {
                field: "cache_key_mode".to_string(),
                value: other.to_string(),
                reason: "expected by_user or by_item_id".to_string(),
            }),
        }
    }
}

/// Settings for the read-through cache and its simulated recompute cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Lifetime of a cache entry, measured from the moment it is set.
    pub cache_ttl: Duration,
    /// Artificial delay paid on every cache miss.
    pub recompute_delay: Duration,
    pub key_mode: CacheKeyMode,
    /// Interval of the optional expired-entry sweeper. `None` disables it.
    pub sweep_interval: Option<Duration>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            recompute_delay: Duration::from_secs(3),
            key_mode: CacheKeyMode::ByUser,
            sweep_interval: None,
        }
    }
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_recompute_delay(mut self, delay: Duration) -> Self {
        self.recompute_delay = delay;
        self
    }

    pub fn with_key_mode(mut self, mode: CacheKeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Load from process environment.
    ///
    /// Environment variables:
    /// - `LISTKEEP_CACHE_TTL_SECS`: entry lifetime (default: 30)
    /// - `LISTKEEP_RECOMPUTE_DELAY_MS`: simulated miss cost (default: 3000)
    /// - `LISTKEEP_CACHE_KEY_MODE`: `by_user` or `by_item_id` (default: by_user)
    /// - `LISTKEEP_CACHE_SWEEP_INTERVAL_SECS`: sweeper interval, 0 disables (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, applying defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_ttl = match lookup("LISTKEEP_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_u64("LISTKEEP_CACHE_TTL_SECS", &raw)?),
            None => defaults.cache_ttl,
        };

        let recompute_delay = match lookup("LISTKEEP_RECOMPUTE_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_u64("LISTKEEP_RECOMPUTE_DELAY_MS", &raw)?),
            None => defaults.recompute_delay,
        };

        let key_mode = match lookup("LISTKEEP_CACHE_KEY_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.key_mode,
        };

        let sweep_interval = match lookup("LISTKEEP_CACHE_SWEEP_INTERVAL_SECS") {
            Some(raw) => match parse_u64("LISTKEEP_CACHE_SWEEP_INTERVAL_SECS", &raw)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => defaults.sweep_interval,
        };

        let config = Self {
            cache_ttl,
            recompute_delay,
            key_mode,
            sweep_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the cache unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache_ttl".to_string(),
                value: "0".to_string(),
                reason: "ttl must be greater than zero".to_string(),
            });
        }
        if matches!(self.sweep_interval, Some(interval) if interval.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval".to_string(),
                value: "0".to_string(),
                reason: "use None to disable the sweeper".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}
