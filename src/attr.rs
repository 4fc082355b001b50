//! The attribute bundle configuring a lock before it is built
//! (`spec.md` §4.1). This is this crate's entire configuration surface —
//! there is no config file or environment variable, matching `spec.md` §6's
//! explicit "no CLI, no on-disk format ... no environment variable".

use std::time::Duration;

use crate::error::Result;
use crate::policy::Policy;

/// Pass-through mirror of `pthread_mutexattr_settype`'s mutex kinds.
///
/// The gate backing this crate is always a [`parking_lot::Mutex`], which
/// does not distinguish these kinds at runtime; the setter/getter pair is
/// retained purely so callers porting from the pthread-flavored API keep a
/// place to put the value. See `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutexKind {
    /// Default OS mutex behavior.
    #[default]
    Default,
    /// Non-recursive, deadlocks on self-relock.
    Normal,
    /// Recursive, same thread may relock.
    Recursive,
    /// Normal, but checked for self-relock/unowned-unlock errors.
    ErrorCheck,
}

/// Configuration for a [`crate::RwLock`], built once and consumed by
/// [`crate::RwLock::with_attr`].
///
/// Defaults (`atbuiltin_rwlockattr_init`): [`Policy::ReadPriority`], a
/// zero write-lock interval (busy-retry, no sleep), not process-shared,
/// [`MutexKind::Default`].
#[derive(Debug, Clone)]
pub struct RwLockAttr {
    policy: Policy,
    write_lock_interval: Duration,
    pshared: bool,
    mutex_kind: MutexKind,
}

impl Default for RwLockAttr {
    fn default() -> Self {
        Self {
            policy: Policy::ReadPriority,
            write_lock_interval: Duration::ZERO,
            pshared: false,
            mutex_kind: MutexKind::Default,
        }
    }
}

impl RwLockAttr {
    /// Equivalent of `atbuiltin_rwlockattr_init`: a freshly defaulted bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Equivalent of `atbuiltin_rwlockattr_destroy`. A no-op on this
    /// backend — `RwLockAttr` owns no sub-attribute resources once the
    /// gate is a `parking_lot::Mutex` rather than a `pthread_mutexattr_t` —
    /// kept for lifecycle symmetry with the abstract interface in
    /// `spec.md` §6.
    pub fn destroy(self) -> Result<()> {
        Ok(())
    }

    /// Set the priority policy.
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Set the priority policy from a raw discriminant, mirroring
    /// `atbuiltin_rwlockattr_settype_np`. Fails with
    /// [`crate::RwLockError::InvalidArgument`] on an unrecognized value.
    pub fn set_policy_raw(&mut self, raw: i32) -> Result<()> {
        self.policy = Policy::from_raw(raw)?;
        Ok(())
    }

    /// The currently configured priority policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Set the maximum single sleep slice a waiting writer takes between
    /// CAS attempts. `Duration::ZERO` disables sleeping (busy-retry).
    pub fn set_write_lock_interval(&mut self, interval: Duration) {
        self.write_lock_interval = interval;
    }

    /// The configured write-lock interval.
    pub fn write_lock_interval(&self) -> Duration {
        self.write_lock_interval
    }

    /// Set whether the condvar should be usable across process boundaries.
    pub fn set_pshared(&mut self, pshared: bool) {
        self.pshared = pshared;
    }

    /// Whether the condvar is configured as process-shared.
    pub fn pshared(&self) -> bool {
        self.pshared
    }

    /// Set the pass-through mutex kind (see [`MutexKind`]).
    pub fn set_mutex_kind(&mut self, kind: MutexKind) {
        self.mutex_kind = kind;
    }

    /// The configured pass-through mutex kind.
    pub fn mutex_kind(&self) -> MutexKind {
        self.mutex_kind
    }
}
