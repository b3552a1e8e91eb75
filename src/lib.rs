//! Expiry Queue - An in-process expiring key-value cache
//!
//! Serves current values in O(1), evicts entries whose TTL has elapsed
//! without scanning the whole set, and keeps a single pending timer
//! outstanding regardless of how many entries are tracked. Built on a
//! generic array-backed binary heap with a hash index from key to heap
//! entry.
//!
//! Requires an ambient tokio runtime; the runtime owns the passive wait for
//! the eviction timer.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, EntrySnapshot, MemoryCache, PriorityQueue, TtlQueue};
pub use config::CacheConfig;
pub use error::InvariantViolation;
