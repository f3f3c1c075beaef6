//! LRU caching layer with per-entry time-to-live.
//!
//! Backs two things:
//! - the load-once search engine (no TTL, lives for the process)
//! - fetched answer bodies (bounded TTL, default one hour)
//!
//! Every entry records when it was inserted. Lookups past the TTL reload
//! through the caller's loader. Loader errors are returned to the caller and
//! never cached.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// Default maximum number of entries.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.cached_at.elapsed() < ttl)
    }
}

/// Cache statistics for monitoring and tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses caused by an expired entry rather than an absent one
    pub expired: u64,
    /// Loader invocations that succeeded
    pub loads: u64,
}

impl CacheStats {
    /// Calculate hit rate.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.hits as f64 / total as f64;
            rate
        }
    }
}

/// Thread-safe LRU cache keyed by `K`.
///
/// The lock is not held while a loader runs, so two callers missing the same
/// key at once may both load; the later insert wins.
pub struct TtlCache<K, V> {
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    stats: Mutex<CacheStats>,
}

impl<K: Hash + Eq, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Return the fresh cached value for `key`, if any.
    pub fn get(&self, key: &K, ttl: Option<Duration>) -> Option<V> {
        let mut entries = self.entries.lock();
        let mut stats = self.stats.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(ttl) => {
                stats.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.pop(key);
                stats.misses += 1;
                stats.expired += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    /// Insert or replace a value, stamping it with the current time.
    pub fn put(&self, key: K, value: V) {
        self.entries.lock().put(
            key,
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Return the cached value or load, cache and return a new one.
    ///
    /// `ttl: None` keeps the entry until it is evicted or invalidated.
    pub fn get_or_load<E>(
        &self,
        key: K,
        ttl: Option<Duration>,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key, ttl) {
            return Ok(value);
        }
        trace!("cache miss, loading");
        let value = loader()?;
        self.stats.lock().loads += 1;
        self.put(key, value.clone());
        Ok(value)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.stats.lock() = CacheStats::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}
