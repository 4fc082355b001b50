//! The adaptive gate acquisition described in `spec.md` §4.8.
//!
//! Acquiring the supporting mutex always starts with one non-blocking
//! attempt; on failure it spins through up to seven more non-blocking tries
//! before falling back to a genuinely blocking (or timed) acquisition. The
//! short spin avoids a syscall under light contention while the fallback
//! keeps the deadline honest under real contention.

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, RwLockError};
use crate::time::Deadline;

/// Number of non-blocking tries attempted before falling back to a real
/// (blocking or timed) lock acquisition: one initial try plus seven more.
const SPIN_ATTEMPTS: u32 = 7;

/// Acquires `gate` using the bounded-spin-then-block protocol.
pub(crate) fn acquire(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    if let Some(g) = gate.try_lock() {
        return g;
    }
    for _ in 0..SPIN_ATTEMPTS {
        if let Some(g) = gate.try_lock() {
            return g;
        }
    }
    gate.lock()
}

/// Acquires `gate` using the bounded-spin-then-block protocol, honoring
/// `deadline`. Returns [`RwLockError::TimedOut`] if the deadline elapses
/// before the gate is acquired.
pub(crate) fn acquire_before(gate: &Mutex<()>, deadline: Deadline) -> Result<MutexGuard<'_, ()>> {
    if let Some(g) = gate.try_lock() {
        return Ok(g);
    }
    for _ in 0..SPIN_ATTEMPTS {
        if let Some(g) = gate.try_lock() {
            return Ok(g);
        }
    }
    let remaining = deadline.remaining().ok_or(RwLockError::TimedOut)?;
    gate.try_lock_for(remaining).ok_or(RwLockError::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn acquire_succeeds_when_free() {
        let gate = Mutex::new(());
        let _g = acquire(&gate);
    }

    #[test]
    fn acquire_before_times_out_when_held() {
        let gate = Mutex::new(());
        let _held = gate.lock();
        let deadline = Deadline::after(Duration::from_millis(5));
        let res = acquire_before(&gate, deadline);
        assert_eq!(res.err(), Some(RwLockError::TimedOut));
    }

    #[test]
    fn acquire_before_succeeds_when_free() {
        let gate = Mutex::new(());
        let deadline = Deadline::after(Duration::from_millis(50));
        assert!(acquire_before(&gate, deadline).is_ok());
    }
}
