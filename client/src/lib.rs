//! Glimmer client data layer
//!
//! The client-side data layer of the Glimmer social application. All
//! persistence, auth, and file storage live in a remote store reached over
//! HTTPS; this crate owns what happens on the way there and back:
//!
//! - **Data access** ([`api`]): typed request/response mapping onto the
//!   remote store, documents coerced into models at the boundary.
//! - **Read-through queries**: cached reads with stale-while-revalidate and
//!   shared in-flight fetches, backed by [`query_cache`].
//! - **Mutations** ([`mutations`]): optimistic local transition, remote
//!   call, then invalidation (success) or rollback (failure).
//!
//! The cache is owned by the [`Client`] and lives exactly as long as it
//! does: build the client at application start, call [`Client::reset`] on
//! logout.

pub mod api;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod remote;

pub use config::{CollectionsConfig, Config, ConfigError};
pub use error::{AppError, Result};
pub use mutations::{LikeDelta, MutationOutcome, MutationState};
pub use query_cache::{CacheEvent, CacheEventKind, CacheRead, QueryCache, QueryKey};

use std::sync::Arc;

use tokio::sync::broadcast;

use remote::{NoShareCapability, ShareCapability, Store};

/// Handle to the data layer: remote store, query cache, share capability
pub struct Client {
    pub(crate) store: Store,
    pub(crate) cache: Arc<QueryCache>,
    pub(crate) share: Arc<dyn ShareCapability>,
}

impl Client {
    /// Connect to the remote store described by the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let store = Store::connect(config)?;
        Ok(Self::with_store(store))
    }

    /// Build from an assembled store (dependency injection for tests)
    pub fn with_store(store: Store) -> Self {
        Self {
            store,
            cache: Arc::new(QueryCache::new()),
            share: Arc::new(NoShareCapability),
        }
    }

    /// Replace the platform share capability
    pub fn with_share(mut self, share: Arc<dyn ShareCapability>) -> Self {
        self.share = share;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Subscribe to cache change events (the re-render contract)
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    /// Logout/reset: drop every cached entry
    pub async fn reset(&self) {
        self.cache.clear().await;
    }
}
