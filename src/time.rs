//! Monotonic deadline helpers.
//!
//! `spec.md` §2 calls for three small leaf operations: compute a monotonic
//! now, subtract a deadline from a start to yield remaining budget, and pick
//! the smaller of two durations. [`std::time::Instant`] is monotonic by
//! construction, so "now" needs no wrapper; [`Deadline`] wraps the point in
//! time a timed call must give up by.

use std::time::{Duration, Instant};

/// An absolute point in time a timed acquisition must complete by.
///
/// Built from a relative [`Duration`] via [`Deadline::after`] rather than
/// from raw seconds+nanoseconds: `std::time::Instant` has no stable
/// epoch-relative constructor, so the abstract "seconds+nanoseconds since
/// an unspecified monotonic epoch" interface of `spec.md` §6 is realized as
/// "duration from now" instead. See `DESIGN.md` for the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now() + duration)
    }

    /// Wrap an already-computed absolute instant.
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Time left until this deadline, or `None` if it has already passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.checked_duration_since(Instant::now())
    }

    /// `true` once `Instant::now()` has reached or passed this deadline.
    pub fn has_elapsed(&self) -> bool {
        self.remaining().is_none()
    }
}

/// The smaller of two durations, used to bound a writer's sleep slice by
/// both the remaining deadline and the configured write-lock interval.
pub(crate) fn smaller_of(a: Duration, b: Duration) -> Duration {
    a.min(b)
}
