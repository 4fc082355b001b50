//! The atomic counter and its companion flags (`spec.md` §3 Data Model).
//!
//! `body` encodes the whole read/write occupancy state in one signed word:
//! `0` is idle, a positive value is a reader count, and [`WRITER_LOCKED`]
//! (the type's minimum) means a single writer holds the lock. Readers probe
//! it optimistically — add one, check, subtract back out if a writer beat
//! them to it — which is the "transient counter probing" `spec.md` §9 calls
//! out as essential, not a bug.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

/// Sentinel `body` value meaning "one writer holds the lock".
pub(crate) const WRITER_LOCKED: i32 = i32::MIN;

static_assertions::const_assert_eq!(WRITER_LOCKED, i32::MIN);

#[derive(Debug)]
pub(crate) struct RawState {
    /// Readers and writer occupancy, per `spec.md` §3's counter invariant.
    pub body: AtomicI32,
    /// Threads currently holding or queued for write under the gate.
    pub writers: AtomicU32,
    /// Timed readers currently parked or racing the counter.
    pub timed_read_waiters: AtomicU32,
    /// Blocking readers currently parked (a count, not a single bit, so
    /// concurrent blocking readers don't clear each other's hint early —
    /// see `DESIGN.md` for why this strengthens the `volatile bool` the
    /// original C source used).
    pub read_waiting: AtomicU32,
    /// A writer currently owns or is about to own exclusive access.
    pub write_waiting: AtomicBool,
}

impl RawState {
    pub fn new() -> Self {
        Self {
            body: AtomicI32::new(0),
            writers: AtomicU32::new(0),
            timed_read_waiters: AtomicU32::new(0),
            read_waiting: AtomicU32::new(0),
            write_waiting: AtomicBool::new(false),
        }
    }

    /// Hint consulted by ReadPriority/NoPriority to decide whether a
    /// writer release should broadcast even while other writers remain
    /// queued (`spec.md` §4.7).
    pub fn readers_waiting(&self) -> bool {
        self.read_waiting.load(Ordering::Relaxed) > 0
            || self.timed_read_waiters.load(Ordering::Relaxed) > 0
    }

    pub fn debug_body(&self) -> i32 {
        self.body.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle() {
        let s = RawState::new();
        assert_eq!(s.debug_body(), 0);
        assert!(!s.readers_waiting());
    }

    #[test]
    fn readers_waiting_reflects_either_counter() {
        let s = RawState::new();
        s.read_waiting.fetch_add(1, Ordering::Relaxed);
        assert!(s.readers_waiting());
        s.read_waiting.fetch_sub(1, Ordering::Relaxed);
        assert!(!s.readers_waiting());

        s.timed_read_waiters.fetch_add(1, Ordering::Relaxed);
        assert!(s.readers_waiting());
    }
}
