//! Single-flight async cache
//!
//! Generic key→value cache with coalesced refresh. For any key, at most
//! one refresh is ever outstanding; every caller that needs the refresh
//! while it is in flight awaits the same shared future and observes the
//! same outcome, value or error.
//!
//! # Staleness protocol
//!
//! `get` takes the caller's obsolescence belief as `Option<&V>`:
//!
//! - `None`: the cached value is never stale; return it if present.
//! - `Some(v)` equal to the cached value: the caller has proven that
//!   value obsolete; refresh.
//! - `Some(v)` different from the cached value: someone else already
//!   refreshed past the caller's snapshot; return the cached value.
//!
//! A missing entry always refreshes, whatever the belief.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Failure of a coalesced refresh, delivered identically to every waiter
#[derive(Debug, Clone, Error)]
#[error("Cache refresh failed: {0}")]
pub struct CacheRefreshError(Arc<anyhow::Error>);

impl CacheRefreshError {
    fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// The underlying refresh error
    pub fn source_error(&self) -> &anyhow::Error {
        &self.0
    }
}

type SharedRefresh<V> = Shared<BoxFuture<'static, Result<V, CacheRefreshError>>>;

/// Per-key cache state.
///
/// Invariant: at most one in-flight refresh exists per key. The marker is
/// installed under the map lock and cleared by the refresh task itself.
struct CacheEntry<V> {
    value: Option<V>,
    in_flight: Option<SharedRefresh<V>>,
}

impl<V> Default for CacheEntry<V> {
    fn default() -> Self {
        Self {
            value: None,
            in_flight: None,
        }
    }
}

/// Generic async cache with single-flight refresh
pub struct AsyncCache<K, V> {
    entries: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
}

impl<K, V> AsyncCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up `key`, refreshing if the entry is missing or if the
    /// caller's `obsolete_value` matches the cached value.
    ///
    /// The refresh future runs on a spawned task, so a caller that stops
    /// awaiting does not cancel it and later waiters still see its
    /// outcome. No lock is held while the refresh executes. On failure
    /// the in-flight marker is cleared and any previously cached value
    /// is left untouched, so a subsequent call may retry.
    pub async fn get<F, Fut>(
        &self,
        key: K,
        obsolete_value: Option<&V>,
        refresh: F,
    ) -> Result<V, CacheRefreshError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(value) = &entry.value {
                let still_fresh = match obsolete_value {
                    None => true,
                    Some(obsolete) => value != obsolete,
                };
                if still_fresh {
                    trace!(key = ?key, "Cache hit");
                    return Ok(value.clone());
                }
            }

            if let Some(in_flight) = &entry.in_flight {
                trace!(key = ?key, "Joining in-flight refresh");
                in_flight.clone()
            } else {
                debug!(key = ?key, "Starting cache refresh");
                // The closure only builds the future under the lock; it
                // is polled on the spawned task.
                let refresh_future = refresh();
                let entries_handle = Arc::clone(&self.entries);
                let task_key = key.clone();
                let task = tokio::spawn(async move {
                    let result = refresh_future.await.map_err(CacheRefreshError::new);
                    let mut entries = entries_handle.lock();
                    if let Some(entry) = entries.get_mut(&task_key) {
                        entry.in_flight = None;
                        if let Ok(value) = &result {
                            entry.value = Some(value.clone());
                        }
                    }
                    result
                });
                let shared: SharedRefresh<V> = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(join_error) => Err(CacheRefreshError::new(anyhow::anyhow!(
                            "refresh task aborted: {join_error}"
                        ))),
                    }
                }
                .boxed()
                .shared();
                entry.in_flight = Some(shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Remove an entry. A refresh already in flight for the key still
    /// completes and satisfies its waiters, but its result is discarded
    /// rather than cached.
    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    /// Number of cached keys (in-flight-only entries included)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, V> Default for AsyncCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
