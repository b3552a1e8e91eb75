//! Cache Module
//!
//! In-process expiring key-value storage: a comparator-driven binary heap,
//! a TTL-indexed queue with a single pending eviction timer, and a thin
//! memory-cache facade over the queue.

mod entry;
mod heap;
mod queue;
mod stats;
mod store;


// Re-export public types
pub use entry::EntrySnapshot;
pub use heap::{default_comparator, PriorityQueue};
pub use queue::TtlQueue;
pub use stats::CacheStats;
pub use store::MemoryCache;
