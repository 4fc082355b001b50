//! A reader-writer lock with selectable reader/writer/no priority, built on
//! a single signed atomic counter plus a supporting mutex and condition
//! variable.
//!
//! Unlike a plain spinning rwlock, this one never spins on contention
//! beyond a short bounded adaptive-gate retry (`spec.md` §4.8): a blocked
//! reader or writer parks on a condvar. Three policies trade off fairness
//! differently:
//!
//! - [`Policy::ReadPriority`] (the default): readers rush in the instant a
//!   writer releases; writers can starve under sustained read load.
//! - [`Policy::NoPriority`]: both classes get a chance after every release.
//! - [`Policy::WritePriority`]: writers queued behind the gate coalesce and
//!   drain consecutively; readers can starve under sustained write load.
//!
//! ```
//! use atbuiltin_rwlock::RwLock;
//!
//! let lock = RwLock::new(0);
//! {
//!     let mut w = lock.write();
//!     *w += 1;
//! }
//! assert_eq!(*lock.read(), 1);
//! ```

mod attr;
mod error;
mod gate;
mod policy;
mod rwlock;
mod state;
mod time;

pub use attr::{MutexKind, RwLockAttr};
pub use error::{Result, RwLockError};
pub use policy::Policy;
pub use rwlock::{ReadGuard, RwLock, WriteGuard};
pub use time::Deadline;
