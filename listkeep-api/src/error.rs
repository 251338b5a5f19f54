//! HTTP error surface.
//!
//! Every failure a handler can produce is an [`ApiError`]: a stable
//! machine-readable [`ErrorCode`] plus a message, rendered as a JSON body
//! with the status the code maps to. Domain errors from `listkeep-core`
//! convert into it with `?`.
//!
//! Store refusals are deliberately vague on the wire (`"Something went
//! wrong"`); the store's reason is only logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use listkeep_core::{
    ConfigError, ListkeepError, RetrievalError, StorageError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when the store refuses a create or change.
pub const OPERATION_FAILED_MESSAGE: &str = "Something went wrong";

/// Machine-readable failure category, serialized as `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No usable API key or bearer token on a user-scoped route.
    Unauthorized,
    InvalidToken,
    TokenExpired,

    /// A query, path or body field failed validation.
    ValidationFailed,
    /// The request could not be interpreted at all.
    InvalidInput,
    /// The store refused a create or change.
    OperationFailed,
    /// The store refused a delete, usually because the id is absent.
    DeleteFailed,

    /// The item does not exist in the store.
    EntityNotFound,

    /// The caller went away while the item was being recomputed.
    RequestCancelled,
    /// The request ran past the configured request timeout.
    Timeout,

    InternalError,
}

impl ErrorCode {
    pub fn status_code(self) -> StatusCode {
        use ErrorCode::*;

        match self {
            Unauthorized | InvalidToken | TokenExpired => StatusCode::UNAUTHORIZED,
            ValidationFailed | InvalidInput | OperationFailed | DeleteFailed => {
                StatusCode::BAD_REQUEST
            }
            EntityNotFound => StatusCode::NOT_FOUND,
            RequestCancelled => StatusCode::REQUEST_TIMEOUT,
            Timeout => StatusCode::GATEWAY_TIMEOUT,
            InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// JSON error body: `{"code": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired, "Authentication token has expired")
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn operation_failed() -> Self {
        Self::new(ErrorCode::OperationFailed, OPERATION_FAILED_MESSAGE)
    }

    pub fn delete_failed(kind: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::DeleteFailed,
            format!("{} {} could not be deleted", kind, id),
        )
    }

    pub fn entity_not_found(kind: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::EntityNotFound, format!("{} {} not found", kind, id))
    }

    pub fn timeout(what: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("{} timed out", what))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// ============================================================================
// DOMAIN ERROR MAPPING
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, id } => ApiError::entity_not_found(kind.as_str(), id),
            StorageError::Rejected { kind, reason } => {
                tracing::debug!(kind = %kind, reason = %reason, "store rejected write");
                ApiError::operation_failed()
            }
            StorageError::DeleteRejected { kind, id } => ApiError::delete_failed(kind.as_str(), id),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "configuration error at request time");
        ApiError::internal_error("Service misconfigured")
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        ApiError::new(ErrorCode::RequestCancelled, err.to_string())
    }
}

impl From<ListkeepError> for ApiError {
    fn from(err: ListkeepError) -> Self {
        match err {
            ListkeepError::Storage(e) => e.into(),
            ListkeepError::Validation(e) => e.into(),
            ListkeepError::Config(e) => e.into(),
            ListkeepError::Retrieval(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
