//! Listkeep Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! item entities, identities, pagination envelopes, retrieval configuration
//! and the error hierarchy. No storage or transport logic lives here.

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;
pub mod pagination;

pub use config::{CacheKeyMode, RetrievalConfig};
pub use entities::{
    ItemKind, Product, ProductChange, ProductDraft, ProductFilter, SortOrder, TodoChange,
    TodoDraft, TodoFilter, TodoItem,
};
pub use error::{
    ConfigError, ListkeepError, ListkeepResult, RetrievalError, StorageError, ValidationError,
};
pub use identity::{ItemId, Timestamp, UserId, UserInfo};
pub use pagination::{PageRequest, PaginatedSlice};
