//! Error kinds returned by [`crate::RwLock`] and [`crate::RwLockAttr`] operations.

use thiserror::Error;

/// Failure modes for the lock's try/timed/blocking operations.
///
/// Mirrors the return-code taxonomy of `spec.md` §7: `busy` and `timed-out`
/// are expected, recoverable outcomes of the try/timed paths; `InvalidArgument`
/// only arises from the raw-discriminant attribute constructor;
/// `Poisoned` stands in for "a fatal error from the underlying primitive
/// other than timeout" even though the `parking_lot` backing this crate
/// does not itself poison on panic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RwLockError {
    /// An unrecognized policy discriminant was passed to a raw constructor.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A try-path call found the lock unavailable without blocking.
    #[error("lock is busy")]
    Busy,

    /// A timed call's deadline elapsed before the lock became available.
    #[error("timed out waiting for lock")]
    TimedOut,

    /// The underlying mutex or condvar reported a failure other than a timeout.
    #[error("underlying synchronization primitive failed")]
    Poisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = core::result::Result<T, RwLockError>;
