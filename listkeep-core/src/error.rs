//! Error types for listkeep operations

use crate::{ItemId, ItemKind};
use thiserror::Error;

/// Item store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Item not found: {kind} with id {id}")]
    NotFound { kind: ItemKind, id: ItemId },

    #[error("Write rejected for {kind}: {reason}")]
    Rejected { kind: ItemKind, reason: String },

    #[error("Delete rejected for {kind} with id {id}")]
    DeleteRejected { kind: ItemKind, id: ItemId },
}

/// Validation errors for item fields and request parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Errors raised by the single-item retrieval path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Retrieval of {kind} {id} was cancelled")]
    Cancelled { kind: ItemKind, id: ItemId },
}

/// Master error type for all listkeep errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListkeepError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),
}

impl ListkeepError {
    /// True when the error is the cancellation of an in-flight retrieval.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ListkeepError::Retrieval(RetrievalError::Cancelled { .. }))
    }

    /// True when the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ListkeepError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for listkeep operations.
pub type ListkeepResult<T> = Result<T, ListkeepError>;

// =============================================================================
// TESTS
// =============================================================================
