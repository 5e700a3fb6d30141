//! In-memory caching with expiry and single-flight coordination.
//!
//! Every fetcher keys its entries with [`cache_key`], a pure function
//! of the logical request, so two logically identical requests always
//! collide. Expiry is lazy: an entry past its deadline is a guaranteed
//! miss on read, and [`CacheStore::clear_expired`] exists only for
//! memory bounding, not correctness.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;

/// Derive a deterministic cache key from an operation name and its
/// parameters. Parameters are sorted so call-site argument order never
/// produces a second key for the same logical request.
pub fn cache_key(operation: &str, params: &[&str]) -> String {
    let mut sorted: Vec<&str> = params.to_vec();
    sorted.sort_unstable();
    format!("{}?{}", operation, sorted.join("&"))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.body.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: String, body: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.map.insert(key, CacheEntry { body, expires_at });
    }
}

/// Thread-safe key/value store with per-entry TTL.
///
/// Uses `tokio::time::Instant` so that paused-clock tests can drive
/// expiry deterministically.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<RwLock<CacheInner>>,
    flights: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
            })),
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the cached value for `key` if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Store `body` under `key` for `ttl`. A zero TTL disables caching
    /// for this entry (it would expire on the next read anyway, so it
    /// is simply not stored).
    pub async fn put(&self, key: impl Into<String>, body: impl Into<String>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let mut store = self.inner.write().await;
        store.put(key.into(), body.into(), ttl);
    }

    /// Drop the entry for `key`, expired or not.
    pub async fn invalidate(&self, key: &str) {
        let mut store = self.inner.write().await;
        store.map.remove(key);
    }

    /// Remove expired entries. Optional memory bounding; correctness
    /// never depends on it.
    pub async fn clear_expired(&self) {
        let now = Instant::now();
        let mut store = self.inner.write().await;
        store.map.retain(|_, entry| entry.expires_at > now);
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Acquire the single-flight guard for `key`.
    ///
    /// Concurrent cache misses on the same key serialize here: the
    /// first caller fetches upstream while the rest wait, then find the
    /// freshly stored entry when they re-check the cache. The guard is
    /// released on drop.
    pub async fn flight(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut flights = self.flights.lock().await;
            flights
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop flight locks nobody is waiting on. The lock map is bounded
    /// by the distinct key space, so this is optional housekeeping like
    /// [`clear_expired`](Self::clear_expired).
    pub async fn prune_flights(&self) {
        let mut flights = self.flights.lock().await;
        flights.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
