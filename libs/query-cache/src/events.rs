//! Cache change events
//!
//! Subscribers (presentation code) re-render on entry change instead of
//! polling. Events are broadcast best-effort: a full or absent receiver never
//! blocks cache operations.

use serde::{Deserialize, Serialize};

use crate::key::QueryKey;

/// What happened to a cache entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CacheEventKind {
    /// Entry value replaced or optimistically updated
    Updated,
    /// Entry marked stale
    Invalidated,
    /// Whole cache dropped (logout/reset)
    Cleared,
}

/// Change notification for one entry (or the whole cache)
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Affected key; `None` for cache-wide events
    pub key: Option<QueryKey>,
    pub kind: CacheEventKind,
}

impl CacheEvent {
    pub fn updated(key: QueryKey) -> Self {
        Self {
            key: Some(key),
            kind: CacheEventKind::Updated,
        }
    }

    pub fn invalidated(key: QueryKey) -> Self {
        Self {
            key: Some(key),
            kind: CacheEventKind::Invalidated,
        }
    }

    pub fn cleared() -> Self {
        Self {
            key: None,
            kind: CacheEventKind::Cleared,
        }
    }
}
