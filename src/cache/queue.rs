//! TTL Queue Module
//!
//! Keyed, TTL-governed store over the binary heap. Guarantees that at most
//! one eviction timer is outstanding per queue and that it always targets
//! the soonest-expiring entry.
//!
//! All mutation is synchronous under one mutex, taken either by the calling
//! thread or by the single timer task; the design is single-writer and the
//! mutex is the required exclusion when the queue is shared. The timer task
//! holds only a weak reference to the queue state, so an armed timer never
//! keeps a dropped queue alive and never calls back into freed state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::entry::{expires_before, EntrySnapshot, ExpirySlot, TimedEntry};
use crate::cache::heap::PriorityQueue;
use crate::error::{fail_invariant, InvariantViolation};

/// Eviction callback, invoked with the expired key. Never invoked for
/// explicit deletes.
type EvictFn = dyn Fn(String) + Send + Sync + 'static;

type SlotComparator = fn(&ExpirySlot, &ExpirySlot) -> bool;

// == Timer State ==
/// The single-timer state machine.
///
/// A tagged variant instead of independently-nullable timer/head fields:
/// "armed iff a head exists iff the heap is non-empty" holds by
/// construction.
enum TimerState {
    /// No live entries, no timer
    Idle,
    /// One sleep task scheduled for the heap minimum
    Armed {
        /// Sequence id of the entry the timer targets
        head_id: u64,
        /// Instant the timer fires at
        deadline: Instant,
        /// Arm generation; a firing task bearing a stale epoch lost a race
        /// with `abort` and must not evict
        epoch: u64,
        /// The outstanding sleep task
        handle: JoinHandle<()>,
    },
}

// == Queue State ==
struct Inner<T> {
    /// TTL-ordered min-heap of expiry slots
    heap: PriorityQueue<ExpirySlot, SlotComparator>,
    /// Key to live entry; always holds exactly the same entries as the heap
    index: HashMap<String, TimedEntry<T>>,
    /// Single-timer state machine
    timer: TimerState,
    /// Next entry sequence id
    next_id: u64,
    /// Next timer arm generation
    next_epoch: u64,
    /// Queue-wide TTL for entries without an override
    default_ttl: Duration,
    /// Invoked once per natural expiry with the evicted key
    on_evict: Arc<EvictFn>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let TimerState::Armed { handle, .. } = &self.timer {
            handle.abort();
        }
    }
}

// == TTL Queue ==
/// Keyed store with per-entry TTLs and a single pending eviction timer.
///
/// Cloning is cheap and shares the underlying state. Construction and all
/// mutating operations require an ambient tokio runtime, which owns the
/// passive wait for the timer to fire.
pub struct TtlQueue<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for TtlQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> TtlQueue<T> {
    // == Constructor ==
    /// Creates a queue with the given default TTL and eviction callback.
    ///
    /// The callback runs once per natural expiry, asynchronously relative to
    /// the `set`/`touch` call that scheduled it, outside the queue lock.
    pub fn new<F>(default_ttl: Duration, on_evict: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        debug!(?default_ttl, "creating ttl queue");
        Self {
            inner: Arc::new(Mutex::new(Inner {
                heap: PriorityQueue::with_comparator(expires_before as SlotComparator),
                index: HashMap::new(),
                timer: TimerState::Idle,
                next_id: 0,
                next_epoch: 0,
                default_ttl,
                on_evict: Arc::new(on_evict),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().expect("ttl queue mutex poisoned")
    }

    // == Set ==
    /// Stores or updates a key.
    ///
    /// An existing key keeps its entry: the value is replaced in place and
    /// the entry is touched, reassigning the stored TTL override only when
    /// `ttl` was supplied (omission preserves the existing override). A new
    /// key expires at `now + ttl.unwrap_or(default)`; the timer is re-armed
    /// when the new entry precedes the current head or no timer was armed.
    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        let mut inner = self.lock();

        if let Some(entry) = inner.index.get_mut(key) {
            entry.value = value;
            let assign = ttl.is_some();
            self.touch_locked(&mut inner, key, ttl, assign);
            return;
        }

        let deadline = Instant::now() + ttl.unwrap_or(inner.default_ttl);
        let id = inner.next_id;
        inner.next_id += 1;

        let entry = TimedEntry {
            key: key.to_string(),
            value,
            deadline,
            ttl_override: ttl,
            id,
        };
        let slot = entry.slot();
        inner.heap.add(slot.clone());
        inner.index.insert(key.to_string(), entry);
        trace!(%key, ?deadline, "entry inserted");

        let needs_arm = match &inner.timer {
            TimerState::Idle => true,
            TimerState::Armed {
                deadline: armed, ..
            } => deadline < *armed,
        };
        if needs_arm {
            self.arm_locked(&mut inner, slot);
        }
    }

    // == Touch ==
    /// Refreshes a key's expiry: `deadline = now + (ttl ?? override ?? default)`.
    ///
    /// The stored override is reassigned only when `assign_override` is
    /// true, which distinguishes "refresh using existing settings" from
    /// "refresh and change the TTL policy"; `(None, true)` explicitly clears
    /// the override back to the queue default. Returns a snapshot of the
    /// refreshed entry, or `None` if the key is absent.
    pub fn touch(
        &self,
        key: &str,
        ttl: Option<Duration>,
        assign_override: bool,
    ) -> Option<EntrySnapshot<T>>
    where
        T: Clone,
    {
        let mut inner = self.lock();
        if !self.touch_locked(&mut inner, key, ttl, assign_override) {
            return None;
        }
        inner.index.get(key).map(TimedEntry::snapshot)
    }

    /// Repositions `key` in the heap under a recomputed deadline and re-arms
    /// the timer when the heap minimum changed identity or timing. Returns
    /// whether the key existed.
    fn touch_locked(
        &self,
        inner: &mut Inner<T>,
        key: &str,
        ttl: Option<Duration>,
        assign_override: bool,
    ) -> bool {
        let default_ttl = inner.default_ttl;
        let (id, deadline) = {
            let Some(entry) = inner.index.get_mut(key) else {
                return false;
            };
            if assign_override {
                entry.ttl_override = ttl;
            }
            let effective = ttl.or(entry.ttl_override).unwrap_or(default_ttl);
            entry.deadline = Instant::now() + effective;
            (entry.id, entry.deadline)
        };

        let was_head = matches!(&inner.timer, TimerState::Armed { head_id, .. } if *head_id == id);

        // Reposition: identity-remove the slot, reinsert under the new deadline
        let probe = ExpirySlot {
            id,
            deadline,
            key: key.to_string(),
        };
        if !inner.heap.remove(&probe) {
            fail_invariant(InvariantViolation::EntryOutsideHeap {
                key: key.to_string(),
            });
        }
        inner.heap.add(probe);
        trace!(%key, ?deadline, "entry touched");

        let Some(head) = inner.heap.peek().cloned() else {
            fail_invariant(InvariantViolation::EmptyHeapWithIndexEntries);
        };

        // The minimum changed if the touched entry was the timer target or
        // the refresh made it the new head
        if was_head || head.id == id {
            self.arm_locked(inner, head);
        }
        true
    }

    // == Get ==
    /// Sliding-expiration read: touches the key with its existing settings
    /// and returns the value, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        self.touch(key, None, false).map(|entry| entry.value)
    }

    // == Get Entry ==
    /// Sliding-expiration read returning the whole entry snapshot.
    pub fn get_entry(&self, key: &str) -> Option<EntrySnapshot<T>>
    where
        T: Clone,
    {
        self.touch(key, None, false)
    }

    // == Update Value ==
    /// Replaces a key's value without refreshing its TTL or moving it in the
    /// heap. Returns whether the key existed.
    pub fn update_value(&self, key: &str, value: T) -> bool {
        let mut inner = self.lock();
        match inner.index.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes a key without invoking the eviction callback. If the removed
    /// entry was the timer target, the timer moves to the new minimum or is
    /// cancelled when the queue drained. Returns whether the key existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let Some(entry) = inner.index.remove(key) else {
            return false;
        };
        let id = entry.id;
        if !inner.heap.remove(&entry.slot()) {
            fail_invariant(InvariantViolation::EntryOutsideHeap {
                key: key.to_string(),
            });
        }
        trace!(%key, "entry deleted");

        let was_head = matches!(&inner.timer, TimerState::Armed { head_id, .. } if *head_id == id);
        if was_head {
            match inner.heap.peek().cloned() {
                Some(next) => self.arm_locked(&mut inner, next),
                None => self.disarm_locked(&mut inner),
            }
        }
        true
    }

    // == Keys ==
    /// Returns the live keys in index order (insertion-independent).
    pub fn keys(&self) -> Vec<String> {
        self.lock().index.keys().cloned().collect()
    }

    // == Has ==
    /// Returns whether a key is live, without TTL side effects.
    pub fn has(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.lock().index.is_empty()
    }

    // == Timer Management ==
    /// Cancels any outstanding timer and schedules one sleep task for
    /// `head`. The previous handle is aborted first, so no two timers for
    /// the queue ever coexist.
    fn arm_locked(&self, inner: &mut Inner<T>, head: ExpirySlot) {
        if inner.heap.is_empty() {
            fail_invariant(InvariantViolation::TimerWithoutEntries);
        }
        if let TimerState::Armed { handle, .. } = &inner.timer {
            handle.abort();
        }

        let epoch = inner.next_epoch;
        inner.next_epoch += 1;
        let deadline = head.deadline;
        trace!(key = %head.key, epoch, ?deadline, "arming eviction timer");

        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(inner) = Weak::upgrade(&weak) else {
                // Queue was dropped while the timer slept
                return;
            };
            TtlQueue { inner }.fire(epoch);
        });

        inner.timer = TimerState::Armed {
            head_id: head.id,
            deadline,
            epoch,
            handle,
        };
    }

    /// Cancels the outstanding timer and returns to idle.
    fn disarm_locked(&self, inner: &mut Inner<T>) {
        if let TimerState::Armed { handle, epoch, .. } = &inner.timer {
            trace!(epoch, "cancelling eviction timer");
            handle.abort();
        }
        inner.timer = TimerState::Idle;
    }

    /// Timer-fire path: evicts the heap minimum and re-arms for the next
    /// entry, then invokes the eviction callback outside the lock.
    fn fire(&self, epoch: u64) {
        let (key, on_evict) = {
            let mut inner = self.lock();

            match &inner.timer {
                TimerState::Armed {
                    epoch: armed_epoch, ..
                } if *armed_epoch == epoch => {}
                _ => {
                    // Abort landed after the sleep completed; the re-armed
                    // timer owns the next eviction
                    trace!(epoch, "stale timer wakeup ignored");
                    return;
                }
            }
            inner.timer = TimerState::Idle;

            let Some(slot) = inner.heap.poll() else {
                fail_invariant(InvariantViolation::TimerWithoutEntries);
            };
            if inner.index.remove(&slot.key).is_none() {
                fail_invariant(InvariantViolation::HeadOutsideIndex {
                    key: slot.key.clone(),
                });
            }
            debug!(key = %slot.key, "entry expired");

            if let Some(next) = inner.heap.peek().cloned() {
                self.arm_locked(&mut inner, next);
            }

            (slot.key, Arc::clone(&inner.on_evict))
        };

        on_evict(key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> TtlQueue<i64> {
        TtlQueue::new(Duration::from_secs(60), |_| {})
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let q = queue();
        q.set("a", 1, None);

        assert_eq!(q.get("a"), Some(1));
        assert_eq!(q.get("missing"), None);
        assert_eq!(q.len(), 1);
        assert!(!q.is_empty());
    }

    #[tokio::test]
    async fn test_set_existing_updates_value_in_place() {
        let q = queue();
        q.set("a", 1, None);
        q.set("a", 2, None);

        assert_eq!(q.get("a"), Some(2));
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn test_set_existing_preserves_override_when_omitted() {
        let q = queue();
        q.set("a", 1, Some(Duration::from_secs(5)));

        // No ttl supplied: the stored override must survive
        q.set("a", 2, None);
        let entry = q.get_entry("a").unwrap();
        assert_eq!(entry.ttl_override, Some(Duration::from_secs(5)));

        // Supplying a ttl reassigns it
        q.set("a", 3, Some(Duration::from_secs(9)));
        let entry = q.get_entry("a").unwrap();
        assert_eq!(entry.ttl_override, Some(Duration::from_secs(9)));
    }

    #[tokio::test]
    async fn test_touch_three_way_override() {
        let q = queue();
        q.set("a", 1, Some(Duration::from_secs(5)));

        // Refresh without assigning: override untouched
        let entry = q.touch("a", Some(Duration::from_secs(2)), false).unwrap();
        assert_eq!(entry.ttl_override, Some(Duration::from_secs(5)));

        // Refresh and assign
        let entry = q.touch("a", Some(Duration::from_secs(7)), true).unwrap();
        assert_eq!(entry.ttl_override, Some(Duration::from_secs(7)));

        // Explicitly clear back to the queue default
        let entry = q.touch("a", None, true).unwrap();
        assert_eq!(entry.ttl_override, None);
    }

    #[tokio::test]
    async fn test_touch_missing_key() {
        let q = queue();
        assert!(q.touch("missing", None, false).is_none());
    }

    #[tokio::test]
    async fn test_touch_extends_deadline() {
        let q = TtlQueue::<i64>::new(Duration::from_secs(60), |_| {});
        q.set("a", 1, Some(Duration::from_secs(1)));
        let before = q.get_entry("a").unwrap().deadline;

        let entry = q.touch("a", Some(Duration::from_secs(30)), false).unwrap();
        assert!(entry.deadline > before);
    }

    #[tokio::test]
    async fn test_update_value_keeps_deadline() {
        let q = queue();
        q.set("a", 1, None);
        let before = q.get_entry("a").unwrap().deadline;

        assert!(q.update_value("a", 2));
        assert!(!q.update_value("missing", 3));

        let entry = q.get_entry("a").unwrap();
        assert_eq!(entry.value, 2);
        // get_entry above refreshed once already; compare against the value
        // recorded before any refresh could only move the deadline forward
        assert!(entry.deadline >= before);
    }

    #[tokio::test]
    async fn test_delete() {
        let q = queue();
        q.set("a", 1, None);
        q.set("b", 2, None);

        assert!(q.delete("a"));
        assert!(!q.delete("a"));
        assert!(!q.has("a"));
        assert!(q.has("b"));
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_last_entry_goes_idle() {
        let q = queue();
        q.set("a", 1, None);
        assert!(q.delete("a"));
        assert!(q.is_empty());

        // The queue must accept new entries after draining
        q.set("b", 2, None);
        assert_eq!(q.get("b"), Some(2));
    }

    #[tokio::test]
    async fn test_keys_and_has() {
        let q = queue();
        q.set("a", 1, None);
        q.set("b", 2, None);

        let mut keys = q.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(q.has("a"));
        assert!(!q.has("c"));
    }
}
