//! Error types for the expiring cache
//!
//! Lookup misses are expected outcomes and surface as `Option`/`bool`
//! returns, never as errors. The only error kind defined here describes a
//! broken internal invariant, which is a programming error and terminates
//! the process rather than being handled.

use thiserror::Error;

// == Invariant Violation Enum ==
/// A broken internal invariant of the TTL queue.
///
/// The timer/head/heap triad and the heap/index coherence must hold at every
/// observable point; any variant below means the implementation itself is
/// wrong. These conditions are never caught or retried.
#[derive(Error, Debug)]
pub enum InvariantViolation {
    /// The eviction timer fired or was armed while no entries were live
    #[error("eviction timer active but the heap reports no entries")]
    TimerWithoutEntries,

    /// The expired heap minimum had no matching entry in the key index
    #[error("expired head {key:?} missing from the key index")]
    HeadOutsideIndex { key: String },

    /// An indexed entry had no matching slot in the heap
    #[error("indexed entry {key:?} missing from the heap")]
    EntryOutsideHeap { key: String },

    /// The key index holds entries but the heap is empty
    #[error("key index is non-empty but the heap is empty")]
    EmptyHeapWithIndexEntries,
}

/// Aborts with the given violation. Invariant breakage must propagate
/// loudly instead of being silently self-healed.
pub(crate) fn fail_invariant(violation: InvariantViolation) -> ! {
    panic!("invariant violation: {violation}");
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_messages_name_the_key() {
        let violation = InvariantViolation::HeadOutsideIndex {
            key: "session:1".to_string(),
        };
        assert!(violation.to_string().contains("session:1"));

        let violation = InvariantViolation::EntryOutsideHeap {
            key: "session:2".to_string(),
        };
        assert!(violation.to_string().contains("session:2"));
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn test_fail_invariant_panics() {
        fail_invariant(InvariantViolation::TimerWithoutEntries);
    }
}
