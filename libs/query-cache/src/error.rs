//! Cache error types

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The fetch failed and no previous value was retained. Carries the
    /// fetcher's error so callers can recover its concrete type; shared
    /// because every attached reader receives the same failure.
    #[error("fetch failed: {0}")]
    FetchFailed(Arc<anyhow::Error>),

    #[error("fetch aborted before completion")]
    FetchAborted,
}

pub type CacheResult<T> = Result<T, CacheError>;
