//! The three priority policies and the small set of places they differ
//! (`spec.md` §4.7): the reader-parking predicate, the condition for
//! broadcasting on writer release, and which flags get maintained.

/// Behavior that varies between [`ReadPriorityPolicy`], [`NoPriorityPolicy`]
/// and [`WritePriorityPolicy`]. Everything else — the counter probing, the
/// gate protocol, the guard shapes — is shared in `rwlock.rs`.
pub(crate) trait LockPolicy: Send + Sync {
    /// Name used in log lines and `Debug` output.
    fn name(&self) -> &'static str;

    /// Whether `try_read` fails fast on `write_waiting` without touching
    /// the counter. `WritePriority` does not pre-check (`spec.md` §4.7).
    fn try_read_checks_writer(&self) -> bool;

    /// Whether a reader blocks in a dedicated `while write_waiting { park }`
    /// loop *before* attempting the counter at all. `NoPriority` and
    /// `WritePriority` do; `ReadPriority` goes straight to the probe loop
    /// and only parks there if a probe fails, so it rushes in the instant
    /// a writer releases.
    fn reader_has_front_wait_loop(&self) -> bool;

    /// Whether a writer arriving at the gate while another writer already
    /// owns it (`write_waiting` already set) coalesces into that writer's
    /// ownership window instead of contending for its own CAS. Only
    /// `WritePriority` coalesces.
    fn writer_coalesces(&self) -> bool;

    /// Whether `read_waiting` / `timed_read_waiters` are maintained at all.
    /// `WritePriority` never tracks them (readers get no special signal).
    fn tracks_reader_flags(&self) -> bool;
}

#[derive(Debug, Default)]
pub(crate) struct ReadPriorityPolicy;

impl LockPolicy for ReadPriorityPolicy {
    fn name(&self) -> &'static str {
        "read-priority"
    }
    fn try_read_checks_writer(&self) -> bool {
        true
    }
    fn reader_has_front_wait_loop(&self) -> bool {
        false
    }
    fn writer_coalesces(&self) -> bool {
        false
    }
    fn tracks_reader_flags(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub(crate) struct NoPriorityPolicy;

impl LockPolicy for NoPriorityPolicy {
    fn name(&self) -> &'static str {
        "no-priority"
    }
    fn try_read_checks_writer(&self) -> bool {
        true
    }
    fn reader_has_front_wait_loop(&self) -> bool {
        true
    }
    fn writer_coalesces(&self) -> bool {
        false
    }
    fn tracks_reader_flags(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub(crate) struct WritePriorityPolicy;

impl LockPolicy for WritePriorityPolicy {
    fn name(&self) -> &'static str {
        "write-priority"
    }
    fn try_read_checks_writer(&self) -> bool {
        false
    }
    fn reader_has_front_wait_loop(&self) -> bool {
        true
    }
    fn writer_coalesces(&self) -> bool {
        true
    }
    fn tracks_reader_flags(&self) -> bool {
        false
    }
}

/// The policy selected for a given lock, chosen once at construction and
/// immutable thereafter (`spec.md` §3 Data Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Readers rush in the instant a writer releases; writers can starve
    /// under sustained read load. The default, matching
    /// `atbuiltin_rwlockattr_init`'s `ATBUILTIN_RWLOCK_READ_PRIORITY`.
    #[default]
    ReadPriority,
    /// Each side gets a chance to run after every release; neither class
    /// is guaranteed bounded wait.
    NoPriority,
    /// Writers queued behind the gate coalesce and drain consecutively;
    /// readers can starve under sustained write load.
    WritePriority,
}

impl Policy {
    /// Parse a raw `i32` discriminant, mirroring
    /// `atbuiltin_rwlockattr_settype_np`'s integer-keyed C interface.
    /// Returns [`crate::RwLockError::InvalidArgument`] for anything else.
    pub fn from_raw(raw: i32) -> crate::error::Result<Self> {
        match raw {
            0 => Ok(Policy::ReadPriority),
            1 => Ok(Policy::NoPriority),
            2 => Ok(Policy::WritePriority),
            _ => Err(crate::error::RwLockError::InvalidArgument(
                "unrecognized rwlock priority policy",
            )),
        }
    }

    pub(crate) fn dispatch(self) -> &'static dyn LockPolicy {
        match self {
            Policy::ReadPriority => &ReadPriorityPolicy,
            Policy::NoPriority => &NoPriorityPolicy,
            Policy::WritePriority => &WritePriorityPolicy,
        }
    }
}
