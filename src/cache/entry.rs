//! Timed Entry Module
//!
//! Defines the entry shapes tracked by the TTL queue: the indexed entry
//! holding the payload, and the heap slot carrying only expiry identity.

use std::time::Duration;

use tokio::time::Instant;

// == Timed Entry ==
/// A live entry as stored in the key index.
///
/// The entry keeps its sequence id across value updates and TTL refreshes;
/// only `value`, `deadline` and (when explicitly reassigned) `ttl_override`
/// change in place.
#[derive(Debug)]
pub(crate) struct TimedEntry<T> {
    /// Caller-supplied identity, unique among live entries
    pub key: String,
    /// Caller payload
    pub value: T,
    /// Absolute monotonic instant at which the entry becomes evictable
    pub deadline: Instant,
    /// Entry-specific TTL overriding the queue default; `None` means
    /// "use the queue default"
    pub ttl_override: Option<Duration>,
    /// Sequence number shared with the entry's heap slot
    pub id: u64,
}

impl<T> TimedEntry<T> {
    /// Returns an observable copy of the entry.
    pub fn snapshot(&self) -> EntrySnapshot<T>
    where
        T: Clone,
    {
        EntrySnapshot {
            key: self.key.clone(),
            value: self.value.clone(),
            deadline: self.deadline,
            ttl_override: self.ttl_override,
        }
    }

    /// The entry's heap slot.
    pub fn slot(&self) -> ExpirySlot {
        ExpirySlot {
            id: self.id,
            deadline: self.deadline,
            key: self.key.clone(),
        }
    }
}

// == Expiry Slot ==
/// The heap-resident half of an entry.
///
/// Equality is by sequence id alone, so removing a slot from the heap is
/// identity removal: the deadline carried by a probe slot is irrelevant to
/// the scan.
#[derive(Debug, Clone)]
pub(crate) struct ExpirySlot {
    pub id: u64,
    pub deadline: Instant,
    pub key: String,
}

impl PartialEq for ExpirySlot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Heap comparator: the slot with the earlier deadline comes first.
pub(crate) fn expires_before(a: &ExpirySlot, b: &ExpirySlot) -> bool {
    a.deadline < b.deadline
}

// == Entry Snapshot ==
/// Point-in-time copy of a live entry, as returned by `touch` and
/// `get_entry`.
#[derive(Debug, Clone)]
pub struct EntrySnapshot<T> {
    /// The entry's key
    pub key: String,
    /// The entry's value at snapshot time
    pub value: T,
    /// Absolute instant at which the entry becomes evictable
    pub deadline: Instant,
    /// Entry-specific TTL, if one is assigned
    pub ttl_override: Option<Duration>,
}

impl<T> EntrySnapshot<T> {
    /// Returns the time remaining until eviction, saturating to zero once
    /// the deadline has passed.
    pub fn ttl_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_equality_is_by_id() {
        let now = Instant::now();
        let a = ExpirySlot {
            id: 1,
            deadline: now,
            key: "a".to_string(),
        };
        let b = ExpirySlot {
            id: 1,
            deadline: now + Duration::from_secs(5),
            key: "b".to_string(),
        };
        let c = ExpirySlot {
            id: 2,
            deadline: now,
            key: "a".to_string(),
        };

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_expires_before() {
        let now = Instant::now();
        let early = ExpirySlot {
            id: 1,
            deadline: now,
            key: "early".to_string(),
        };
        let late = ExpirySlot {
            id: 2,
            deadline: now + Duration::from_millis(10),
            key: "late".to_string(),
        };

        assert!(expires_before(&early, &late));
        assert!(!expires_before(&late, &early));
        assert!(!expires_before(&early, &early.clone()));
    }

    #[test]
    fn test_snapshot_preserves_fields() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let entry = TimedEntry {
            key: "k".to_string(),
            value: 42,
            deadline,
            ttl_override: Some(Duration::from_secs(10)),
            id: 7,
        };

        let snapshot = entry.snapshot();
        assert_eq!(snapshot.key, "k");
        assert_eq!(snapshot.value, 42);
        assert_eq!(snapshot.deadline, deadline);
        assert_eq!(snapshot.ttl_override, Some(Duration::from_secs(10)));

        let remaining = snapshot.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_ttl_remaining_saturates_at_zero() {
        let snapshot = EntrySnapshot {
            key: "k".to_string(),
            value: (),
            deadline: Instant::now(),
            ttl_override: None,
        };
        assert_eq!(snapshot.ttl_remaining(), Duration::ZERO);
    }
}
