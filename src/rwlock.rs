//! The public lock type and its guards (`spec.md` §4.2, §4.6, §6).
//!
//! This is the acquisition engine: the writer fast path, the reader park
//! protocol and the try/read/write release paths shared by all three
//! policies, with the handful of policy-specific choices delegated to
//! [`crate::policy::LockPolicy`].

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::Ordering;
use std::thread;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::attr::RwLockAttr;
use crate::error::{Result, RwLockError};
use crate::gate;
use crate::policy::{LockPolicy, Policy};
use crate::state::{RawState, WRITER_LOCKED};
use crate::time::{smaller_of, Deadline};

/// A reader-writer lock with a selectable priority policy.
///
/// Backed by a single signed atomic counter (`spec.md` §3): readers bump it
/// optimistically and undo on contention, a writer claims it with one CAS
/// from `0` to `i32::MIN`. The supporting mutex and condvar (here,
/// `parking_lot::Mutex`/`Condvar`) are only touched to park a blocked
/// caller or to serialize writers — the fast paths never take them.
pub struct RwLock<T> {
    state: RawState,
    policy: Policy,
    interval: std::time::Duration,
    gate: Mutex<()>,
    cond: Condvar,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    /// Build a lock with the default attribute bundle (read-priority, no
    /// write-lock interval).
    pub fn new(data: T) -> Self {
        Self::with_attr(data, RwLockAttr::default())
    }

    /// Build a lock configured by `attr`.
    pub fn with_attr(data: T, attr: RwLockAttr) -> Self {
        debug!(policy = ?attr.policy(), interval_ns = attr.write_lock_interval().as_nanos(), "initializing rwlock");
        Self {
            state: RawState::new(),
            policy: attr.policy(),
            interval: attr.write_lock_interval(),
            gate: Mutex::new(()),
            cond: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    #[inline]
    fn dispatch(&self) -> &'static dyn LockPolicy {
        self.policy.dispatch()
    }

    /// Debug-only window into the raw counter, replacing the original C
    /// source's practice of handing tests the field directly
    /// (`spec.md` §9 Open Questions). Not part of the stable acquisition
    /// API — only meant for assertions in tests.
    pub fn debug_body(&self) -> i32 {
        self.state.debug_body()
    }

    /// Debug-only window into the `write_waiting` hint; see [`Self::debug_body`].
    pub fn debug_write_waiting(&self) -> bool {
        self.state.write_waiting.load(Ordering::Relaxed)
    }

    // ---- read side -----------------------------------------------------

    /// Non-blocking read acquisition (`spec.md` §4.3).
    #[inline]
    pub fn try_read(&self) -> Result<ReadGuard<'_, T>> {
        if self.dispatch().try_read_checks_writer() && self.state.write_waiting.load(Ordering::Acquire) {
            return Err(RwLockError::Busy);
        }
        let cnt = self.state.body.fetch_add(1, Ordering::Relaxed) + 1;
        if cnt > 0 {
            Ok(ReadGuard { lock: self })
        } else {
            self.state.body.fetch_sub(1, Ordering::Relaxed);
            Err(RwLockError::Busy)
        }
    }

    /// Blocking read acquisition. Always eventually succeeds once no
    /// writer holds or is entering the lock (`spec.md` §8 Progress).
    pub fn read(&self) -> ReadGuard<'_, T> {
        if self.dispatch().reader_has_front_wait_loop() {
            while self.state.write_waiting.load(Ordering::Acquire) {
                self.park_reader_blocking();
            }
        }
        loop {
            let cnt = self.state.body.fetch_add(1, Ordering::Relaxed) + 1;
            if cnt > 0 {
                return ReadGuard { lock: self };
            }
            self.state.body.fetch_sub(1, Ordering::Relaxed);
            self.park_reader_blocking();
        }
    }

    /// Timed read acquisition; returns [`RwLockError::TimedOut`] if
    /// `deadline` elapses first.
    pub fn timed_read(&self, deadline: Deadline) -> Result<ReadGuard<'_, T>> {
        if self.dispatch().reader_has_front_wait_loop() {
            while self.state.write_waiting.load(Ordering::Acquire) {
                self.park_reader_timed(deadline)?;
            }
        }
        loop {
            let cnt = self.state.body.fetch_add(1, Ordering::Relaxed) + 1;
            if cnt > 0 {
                return Ok(ReadGuard { lock: self });
            }
            self.state.body.fetch_sub(1, Ordering::Relaxed);
            self.park_reader_timed(deadline)?;
        }
    }

    fn park_reader_blocking(&self) {
        let tracks = self.dispatch().tracks_reader_flags();
        if tracks {
            self.state.read_waiting.fetch_add(1, Ordering::Relaxed);
        }
        {
            let mut held = gate::acquire(&self.gate);
            if self.state.write_waiting.load(Ordering::Acquire) {
                self.cond.wait(&mut held);
            }
        }
        if tracks {
            self.state.read_waiting.fetch_sub(1, Ordering::Relaxed);
        }
    }

    fn park_reader_timed(&self, deadline: Deadline) -> Result<()> {
        let tracks = self.dispatch().tracks_reader_flags();
        if tracks {
            self.state.timed_read_waiters.fetch_add(1, Ordering::Relaxed);
        }
        let result = (|| -> Result<()> {
            let mut held = gate::acquire_before(&self.gate, deadline)?;
            if self.state.write_waiting.load(Ordering::Acquire) {
                let remaining = deadline.remaining().ok_or(RwLockError::TimedOut)?;
                let wait_result = self.cond.wait_for(&mut held, remaining);
                if wait_result.timed_out() && self.state.write_waiting.load(Ordering::Acquire) {
                    return Err(RwLockError::TimedOut);
                }
            }
            Ok(())
        })();
        if tracks {
            self.state.timed_read_waiters.fetch_sub(1, Ordering::Relaxed);
        }
        result
    }

    /// Read-release (`spec.md` §4.4): subtract one from `body`. No
    /// notification is needed — writers poll the counter while they wait.
    #[inline]
    fn read_release(&self) {
        self.state.body.fetch_sub(1, Ordering::Relaxed);
    }

    // ---- write side ------------------------------------------------------

    /// Non-blocking write acquisition (`spec.md` §4.5).
    pub fn try_write(&self) -> Result<WriteGuard<'_, T>> {
        let held = self.gate.try_lock().ok_or(RwLockError::Busy)?;
        if self
            .state
            .body
            .compare_exchange(0, WRITER_LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.state.writers.fetch_add(1, Ordering::Relaxed);
            self.state.write_waiting.store(true, Ordering::Release);
            Ok(WriteGuard { lock: self, held })
        } else {
            Err(RwLockError::Busy)
        }
    }

    /// Blocking write acquisition.
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.state.writers.fetch_add(1, Ordering::Relaxed);
        let held = gate::acquire(&self.gate);
        if self.dispatch().writer_coalesces() && self.state.write_waiting.load(Ordering::Acquire) {
            trace!(policy = self.dispatch().name(), "writer coalesced into in-progress write");
            return WriteGuard { lock: self, held };
        }
        self.state.write_waiting.store(true, Ordering::Release);
        loop {
            if self
                .state
                .body
                .compare_exchange(0, WRITER_LOCKED, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return WriteGuard { lock: self, held };
            }
            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }
    }

    /// Timed write acquisition; returns [`RwLockError::TimedOut`] if
    /// `deadline` elapses first. Fully undoes `writers` accounting on
    /// timeout (`spec.md` §5 Cancellation).
    pub fn timed_write(&self, deadline: Deadline) -> Result<WriteGuard<'_, T>> {
        self.state.writers.fetch_add(1, Ordering::Relaxed);
        let held = match gate::acquire_before(&self.gate, deadline) {
            Ok(held) => held,
            Err(err) => {
                self.state.writers.fetch_sub(1, Ordering::Relaxed);
                return Err(err);
            }
        };
        if self.dispatch().writer_coalesces() && self.state.write_waiting.load(Ordering::Acquire) {
            trace!(policy = self.dispatch().name(), "writer coalesced into in-progress write");
            return Ok(WriteGuard { lock: self, held });
        }
        self.state.write_waiting.store(true, Ordering::Release);
        loop {
            if self
                .state
                .body
                .compare_exchange(0, WRITER_LOCKED, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(WriteGuard { lock: self, held });
            }
            match deadline.remaining() {
                Some(remaining) => {
                    if !self.interval.is_zero() {
                        thread::sleep(smaller_of(remaining, self.interval));
                    }
                }
                None => {
                    self.giveup_writer();
                    return Err(RwLockError::TimedOut);
                }
            }
        }
    }

    /// Decrements `writers` and decides whether this release should hand
    /// `write_waiting`/`body` back to the idle state.
    ///
    /// Only [`Policy::WritePriority`] coalesces queued writers into a
    /// shared ownership window, so only it needs to check whether another
    /// writer is still queued (`last_writer`) or readers are waiting before
    /// giving up that window. `ReadPriority` and `NoPriority` never
    /// coalesce — each writer independently CASed `body` for itself — so
    /// every release under those policies must unconditionally hand it
    /// back; gating it on `writers`/`readers_waiting` the same way
    /// `WritePriority` does would leave `body` stuck at
    /// [`WRITER_LOCKED`] forever once a second writer is already queued at
    /// release time, since nothing else will ever reset it
    /// (`examples/original_source/src/atbuiltin_rwlock.c`'s `wunlock` takes
    /// the same unconditional `else` branch for these two policies).
    fn writer_release_decision(&self) -> (u32, bool) {
        let remaining = self.state.writers.fetch_sub(1, Ordering::Relaxed) - 1;
        let release = if self.dispatch().writer_coalesces() {
            let last_writer = remaining == 0;
            last_writer || (self.dispatch().tracks_reader_flags() && self.state.readers_waiting())
        } else {
            true
        };
        (remaining, release)
    }

    /// A writer giving up on a timed wait decrements `writers` and, if this
    /// release should hand the ownership window back (see
    /// [`Self::writer_release_decision`]), clears `write_waiting` and wakes
    /// parked readers before the gate guard drops (`spec.md` §4.6, §7).
    fn giveup_writer(&self) {
        let (remaining, release) = self.writer_release_decision();
        if release {
            self.state.write_waiting.store(false, Ordering::Release);
            self.cond.notify_all();
        }
        trace!(policy = self.dispatch().name(), remaining, released = release, "writer timed out waiting for readers to drain");
    }

    /// Writer release (`spec.md` §4.6). Hands `body` back to `0`
    /// unconditionally under `ReadPriority`/`NoPriority`; under
    /// `WritePriority`, only once the last queued writer releases or
    /// readers are waiting, giving them a window between consecutive
    /// writers (see [`Self::writer_release_decision`]).
    fn write_release(&self) {
        let (remaining, release) = self.writer_release_decision();
        if release {
            while self
                .state
                .body
                .compare_exchange_weak(WRITER_LOCKED, 0, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {}
            self.state.write_waiting.store(false, Ordering::Release);
            self.cond.notify_all();
        }
        trace!(policy = self.dispatch().name(), remaining, released = release, "write unlocked");
    }
}

/// Read access to the data protected by an [`RwLock`].
pub struct ReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.read_release();
    }
}

/// Exclusive access to the data protected by an [`RwLock`]. Holds the gate
/// for the guard's whole lifetime, so a second writer blocks (or coalesces,
/// under [`Policy::WritePriority`]) until this guard drops.
pub struct WriteGuard<'a, T> {
    lock: &'a RwLock<T>,
    held: MutexGuard<'a, ()>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.write_release();
        // `held` drops right after, releasing the gate.
    }
}
