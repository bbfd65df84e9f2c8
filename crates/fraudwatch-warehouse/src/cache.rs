//! In-memory read-through cache for query results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::query::QueryKey;
use crate::tabular::TabularResult;

/// Whether a value came from the cache or was computed for this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }
}

/// Counters describing cache usage since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub clears: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<TabularResult>,
    created_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<QueryKey, CacheEntry>,
    stats: CacheStats,
}

impl CacheInner {
    fn get(&mut self, key: &QueryKey, ttl: Duration) -> Option<Arc<TabularResult>> {
        let fresh = self
            .map
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| Arc::clone(&entry.value));
        if fresh.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        fresh
    }

    fn put(&mut self, key: QueryKey, value: Arc<TabularResult>) {
        self.stats.inserts += 1;
        self.map.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }
}

/// Query results keyed by [`QueryKey`], valid for a caller-supplied TTL.
///
/// There is no size bound and no eviction other than TTL expiry. The lock
/// is released while a value is computed, so a concurrent [`clear_all`]
/// may be followed by a repopulating insert.
///
/// [`clear_all`]: QueryCache::clear_all
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cached value for `key`, if any.
    pub fn get(&self, key: &QueryKey, ttl: Duration) -> Option<Arc<TabularResult>> {
        self.lock().get(key, ttl)
    }

    /// Return the fresh entry for `key` or compute, store and return a new one.
    pub fn get_or_compute(
        &self,
        key: &QueryKey,
        ttl: Duration,
        compute: impl FnOnce() -> TabularResult,
    ) -> Arc<TabularResult> {
        match self.get_or_try_compute(key, ttl, || Ok::<_, std::convert::Infallible>(compute())) {
            Ok((value, _)) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_compute`]. Errors are not cached.
    ///
    /// [`get_or_compute`]: QueryCache::get_or_compute
    pub fn get_or_try_compute<E>(
        &self,
        key: &QueryKey,
        ttl: Duration,
        compute: impl FnOnce() -> Result<TabularResult, E>,
    ) -> Result<(Arc<TabularResult>, CacheStatus), E> {
        if let Some(value) = self.get(key, ttl) {
            debug!(rows = value.row_count(), "query cache hit");
            return Ok((value, CacheStatus::Hit));
        }

        debug!("query cache miss");
        let value = Arc::new(compute()?);
        self.lock().put(key.clone(), Arc::clone(&value));
        Ok((value, CacheStatus::Miss))
    }

    /// Remove every entry regardless of age.
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        let removed = inner.map.len();
        inner.map.clear();
        inner.stats.clears += 1;
        debug!(removed, "query cache cleared");
    }

    /// Drop entries older than `ttl`.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let mut inner = self.lock();
        let before = inner.map.len();
        inner.map.retain(|_, entry| entry.is_fresh(ttl));
        before - inner.map.len()
    }

    /// Number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
