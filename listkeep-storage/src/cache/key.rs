//! Cache key derivation for single-item reads.
//!
//! Keys can only be built from a user id or an item id, so nothing outside
//! this module can invent a key shape the orchestrator does not use.

use std::fmt;

use listkeep_core::{CacheKeyMode, ItemId, ItemKind, UserInfo, UserId};

/// Prefix of keys derived from an item id.
const ITEM_PREFIX: &str = "item:";

/// Key of one cache entry.
///
/// In [`CacheKeyMode::ByUser`] the key is the acting user's id verbatim and
/// ignores the item kind, so a user holds at most one entry in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key under which a user's single cached item lives.
    pub fn for_user(user_id: &UserId) -> Self {
        Self(user_id.as_str().to_string())
    }

    /// Key for a specific item, independent of who reads it.
    pub fn for_item(kind: ItemKind, item_id: ItemId) -> Self {
        Self(format!("{}{}:{}", ITEM_PREFIX, kind.as_str(), item_id))
    }

    /// Derive the key for `user` reading item `item_id` of `kind` under `mode`.
    pub fn for_read(mode: CacheKeyMode, kind: ItemKind, user: &UserInfo, item_id: ItemId) -> Self {
        match mode {
            CacheKeyMode::ByUser => Self::for_user(&user.id),
            CacheKeyMode::ByItemId => Self::for_item(kind, item_id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
