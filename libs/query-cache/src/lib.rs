//! Client-side query cache
//!
//! Provides a consistent read-through caching strategy for the client data
//! layer with:
//! - Stale-while-revalidate entries keyed by logical query identity
//! - In-flight de-duplication (concurrent reads share one fetch)
//! - Explicit invalidation by key or by operation prefix
//! - Optimistic in-place updates that a later refetch overwrites
//! - Change events for subscribers (re-render without polling)
//!
//! The cache is an explicit service object with injected lifecycle: create it
//! at application start, pass it by reference, call [`QueryCache::clear`] on
//! logout. It is never a global.
//!
//! # Example
//!
//! ```no_run
//! use query_cache::{QueryCache, QueryKey};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = QueryCache::new();
//!     let key = QueryKey::new("post_by_id").arg("p1");
//!
//!     let read = cache
//!         .read(&key, || async { Ok::<_, anyhow::Error>("hello".to_string()) })
//!         .await?;
//!     assert!(!read.stale);
//!
//!     cache.invalidate(&key).await;
//!     Ok(())
//! }
//! ```

mod error;
mod events;
mod key;

pub use error::{CacheError, CacheResult};
pub use events::{CacheEvent, CacheEventKind};
pub use key::{QueryKey, KEY_VERSION};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

/// Broadcast payload for a completed fetch; must be cloneable for fan-out
type FetchOutcome = Result<Value, Arc<anyhow::Error>>;

/// Capacity of the change-event channel; slow subscribers lag, never block
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of a cache read
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    /// The cached or freshly fetched value
    pub value: T,
    /// True when the value is last-known-good served after a refresh failure
    pub stale: bool,
    /// The refresh error, when `stale` is set because a fetch failed
    pub refresh_error: Option<String>,
}

impl<T> CacheRead<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            stale: false,
            refresh_error: None,
        }
    }
}

#[derive(Default)]
struct Entry {
    /// Last stored value, fresh or stale
    value: Option<Value>,
    fresh: bool,
    /// Bumped on every invalidation; a fetch only marks the entry fresh when
    /// the epoch it started under is still current
    epoch: u64,
    /// Present while a fetch for this key is outstanding
    inflight: Option<broadcast::Sender<FetchOutcome>>,
}

enum ReadPlan {
    Hit(Value),
    Attach(broadcast::Receiver<FetchOutcome>),
    Fetch {
        tx: broadcast::Sender<FetchOutcome>,
        epoch: u64,
    },
}

/// Query cache service
pub struct QueryCache {
    state: Mutex<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to entry change events
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Read through the cache.
    ///
    /// A fresh entry is returned without invoking `fetch`. Otherwise `fetch`
    /// runs at most once per key under concurrency: readers arriving while a
    /// fetch is outstanding attach to it instead of issuing another one.
    ///
    /// When `fetch` fails and a previous value is retained, that value is
    /// served with `stale` set and the error attached; the cache never
    /// discards last-known-good data on a failed refresh. When nothing is
    /// retained the error is returned.
    pub async fn read<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> CacheResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let plan = {
            let mut state = self.state.lock().await;
            let entry = state.entry(key.clone()).or_default();

            if entry.fresh {
                match &entry.value {
                    Some(value) => {
                        debug!(key = %key, "cache hit");
                        ReadPlan::Hit(value.clone())
                    }
                    // Fresh entries always carry a value; treat the
                    // impossible combination as a miss.
                    None => Self::begin_fetch(entry),
                }
            } else if let Some(tx) = &entry.inflight {
                debug!(key = %key, "attaching to in-flight fetch");
                ReadPlan::Attach(tx.subscribe())
            } else {
                debug!(key = %key, "cache miss, fetching");
                Self::begin_fetch(entry)
            }
        };

        match plan {
            ReadPlan::Hit(value) => Ok(CacheRead::fresh(serde_json::from_value(value)?)),
            ReadPlan::Attach(mut rx) => match rx.recv().await {
                Ok(Ok(value)) => Ok(CacheRead::fresh(serde_json::from_value(value)?)),
                Ok(Err(error)) => self.serve_stale(key, error).await,
                Err(_) => Err(CacheError::FetchAborted),
            },
            ReadPlan::Fetch { tx, epoch } => {
                let outcome = fetch().await;

                let mut state = self.state.lock().await;
                let entry = state.entry(key.clone()).or_default();
                entry.inflight = None;

                match outcome {
                    Ok(value) => {
                        let raw = serde_json::to_value(&value)?;
                        entry.value = Some(raw.clone());
                        // An invalidation that landed mid-flight keeps the
                        // entry stale so the next read refetches.
                        entry.fresh = entry.epoch == epoch;
                        drop(state);

                        let _ = tx.send(Ok(raw));
                        self.emit(CacheEvent::updated(key.clone()));
                        Ok(CacheRead::fresh(value))
                    }
                    Err(err) => {
                        let error = Arc::new(err);
                        drop(state);

                        let _ = tx.send(Err(error.clone()));
                        self.serve_stale(key, error).await
                    }
                }
            }
        }
    }

    fn begin_fetch(entry: &mut Entry) -> ReadPlan {
        let (tx, _) = broadcast::channel(1);
        entry.inflight = Some(tx.clone());
        ReadPlan::Fetch {
            tx,
            epoch: entry.epoch,
        }
    }

    async fn serve_stale<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        error: Arc<anyhow::Error>,
    ) -> CacheResult<CacheRead<T>> {
        let state = self.state.lock().await;
        if let Some(entry) = state.get(key) {
            if let Some(raw) = &entry.value {
                let value = serde_json::from_value(raw.clone())?;
                warn!(key = %key, error = %error, "serving stale value after refresh failure");
                return Ok(CacheRead {
                    value,
                    stale: true,
                    refresh_error: Some(error.to_string()),
                });
            }
        }
        Err(CacheError::FetchFailed(error))
    }

    /// Apply an optimistic in-place update to an existing entry.
    ///
    /// Freshness is left unchanged: the optimistic value is a proposal that
    /// the next authoritative refetch overwrites. Returns the updated value,
    /// or `None` when the key holds nothing to update.
    pub async fn update<T, F>(&self, key: &QueryKey, apply: F) -> CacheResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut state = self.state.lock().await;
            let Some(entry) = state.get_mut(key) else {
                return Ok(None);
            };
            let Some(raw) = entry.value.clone() else {
                return Ok(None);
            };

            let mut typed: T = serde_json::from_value(raw)?;
            apply(&mut typed);
            entry.value = Some(serde_json::to_value(&typed)?);
            typed
        };

        debug!(key = %key, "optimistic update applied");
        self.emit(CacheEvent::updated(key.clone()));
        Ok(Some(updated))
    }

    /// Store a fresh value directly (read-through population)
    pub async fn write<T: Serialize>(&self, key: &QueryKey, value: &T) -> CacheResult<()> {
        let raw = serde_json::to_value(value)?;
        {
            let mut state = self.state.lock().await;
            let entry = state.entry(key.clone()).or_default();
            entry.value = Some(raw);
            entry.fresh = true;
        }

        debug!(key = %key, "cache write");
        self.emit(CacheEvent::updated(key.clone()));
        Ok(())
    }

    /// Typed view of the current entry value, fresh or stale, without fetching
    pub async fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> CacheResult<Option<T>> {
        let state = self.state.lock().await;
        match state.get(key).and_then(|entry| entry.value.clone()) {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    /// Mark one entry stale; the next read fetches
    pub async fn invalidate(&self, key: &QueryKey) {
        let invalidated = {
            let mut state = self.state.lock().await;
            match state.get_mut(key) {
                Some(entry) => {
                    entry.fresh = false;
                    entry.epoch += 1;
                    true
                }
                None => false,
            }
        };

        if invalidated {
            debug!(key = %key, "invalidated");
            self.emit(CacheEvent::invalidated(key.clone()));
        }
    }

    /// Mark every entry of the given operation stale
    pub async fn invalidate_op(&self, op: &str) {
        let invalidated: Vec<QueryKey> = {
            let mut state = self.state.lock().await;
            state
                .iter_mut()
                .filter(|(key, _)| key.matches_op(op))
                .map(|(key, entry)| {
                    entry.fresh = false;
                    entry.epoch += 1;
                    key.clone()
                })
                .collect()
        };

        debug!(op = %op, count = invalidated.len(), "prefix invalidation");
        for key in invalidated {
            self.emit(CacheEvent::invalidated(key));
        }
    }

    /// Drop every entry (logout/reset)
    pub async fn clear(&self) {
        {
            let mut state = self.state.lock().await;
            state.clear();
        }
        debug!("cache cleared");
        self.emit(CacheEvent::cleared());
    }

    /// Number of entries currently held
    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine; events are best-effort.
        let _ = self.events.send(event);
    }
}
