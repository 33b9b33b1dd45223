//! Error types for the client data layer
//!
//! Every fallible operation surfaces one of these variants. Validation errors
//! are raised before any network call; remote failures are retryable only by
//! a new user action (no automatic retry/backoff anywhere in this crate).

use thiserror::Error;

use crate::remote::StoreError;

/// Result type for client data-layer operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Client-side validation failed before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network or server failure; retryable by a new user action
    #[error("remote store failure: {0}")]
    Remote(String),

    /// Terminal: the referenced resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Fail-closed conflict, e.g. unsave with a stale record identifier
    #[error("conflict: {0}")]
    Conflict(String),

    /// The platform capability needed for this operation is absent
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A remote document did not match the expected collection shape
    #[error("malformed document: {0}")]
    Document(String),
}

impl AppError {
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::Remote(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Network(msg) => AppError::Remote(msg),
            StoreError::Server { status, message } => {
                AppError::Remote(format!("server returned {}: {}", status, message))
            }
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Decode(msg) => AppError::Document(msg),
        }
    }
}

impl From<query_cache::CacheError> for AppError {
    fn from(err: query_cache::CacheError) -> Self {
        match err {
            // A failed fetch with nothing retained carries the data-access
            // error through; the taxonomy (NotFound vs Remote) must survive
            // the read path.
            query_cache::CacheError::FetchFailed(source) => source
                .downcast_ref::<AppError>()
                .cloned()
                .unwrap_or_else(|| AppError::Remote(source.to_string())),
            query_cache::CacheError::FetchAborted => {
                AppError::Remote("fetch aborted before completion".to_string())
            }
            query_cache::CacheError::Serialization(err) => AppError::Document(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
