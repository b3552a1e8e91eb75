//! Memory Cache Module
//!
//! Thin keyed facade over the TTL queue. No additional eviction logic lives
//! here; every operation delegates to [`TtlQueue`], and the queue's eviction
//! callback only records stats.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::entry::EntrySnapshot;
use crate::cache::queue::TtlQueue;
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::config::CacheConfig;

// == Memory Cache ==
/// In-process expiring key-value cache.
///
/// Reads slide expiration: `get` refreshes the entry's TTL using its stored
/// settings. Cloning is cheap and shares the underlying store.
pub struct MemoryCache<T> {
    /// TTL-governed store
    queue: TtlQueue<T>,
    /// Performance counters
    stats: Arc<StatsCounters>,
}

impl<T> Clone for MemoryCache<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T: Send + 'static> MemoryCache<T> {
    // == Constructor ==
    /// Creates a cache from the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let stats = Arc::new(StatsCounters::default());
        let evict_stats = Arc::clone(&stats);
        let queue = TtlQueue::new(config.default_ttl(), move |key| {
            debug!(%key, "cache entry expired");
            evict_stats.record_expiration();
        });
        Self { queue, stats }
    }

    // == Get ==
    /// Retrieves a value, refreshing its TTL. Returns `None` if the key is
    /// absent or already expired.
    pub fn get(&self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        match self.queue.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get Entry ==
    /// Retrieves the full entry snapshot, refreshing its TTL.
    pub fn get_entry(&self, key: &str) -> Option<EntrySnapshot<T>>
    where
        T: Clone,
    {
        self.queue.get_entry(key)
    }

    // == Set ==
    /// Stores a key-value pair with an optional per-entry TTL.
    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        self.queue.set(key, value, ttl);
    }

    // == Delete ==
    /// Removes a key. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.queue.delete(key)
    }

    // == TTL ==
    /// Refreshes a key and reassigns its stored TTL override; `None`
    /// explicitly clears the override back to the default. Returns the
    /// refreshed entry, or `None` if the key is absent.
    pub fn ttl(&self, key: &str, ttl: Option<Duration>) -> Option<EntrySnapshot<T>>
    where
        T: Clone,
    {
        self.queue.touch(key, ttl, true)
    }

    // == Keys ==
    /// Returns the live keys in index order.
    pub fn keys(&self) -> Vec<String> {
        self.queue.keys()
    }

    // == Has ==
    /// Returns whether a key is live, without refreshing it.
    pub fn has(&self, key: &str) -> bool {
        self.queue.has(key)
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.queue.len())
    }
}

impl<T: Send + 'static> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
