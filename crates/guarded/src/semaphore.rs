// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Blocking counting semaphore.
//!
//! Mutex-protected permit count plus a condvar for waiters. Slots are handed
//! out as `Permit`s that release on drop, so a panicking holder still frees
//! its slot. Waiters are not served in FIFO order.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::timeout::{TimedOut, Timeout};

/// Admits up to `capacity` holders at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
    capacity: usize,
}

impl Semaphore {
    /// Create a semaphore with `capacity` free slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; such a semaphore could never be acquired.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "semaphore capacity must be non-zero");
        if capacity > 1 {
            log::debug!("semaphore created with capacity {capacity}");
        }
        Self {
            permits: Mutex::new(capacity),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Number of holders admitted at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until a slot is free and take it.
    pub fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits();
        if *permits == 0 {
            log::trace!("semaphore full, waiting for a release");
            permits = self
                .available
                .wait_while(permits, |free| *free == 0)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
        Permit { semaphore: self }
    }

    /// Take a slot, waiting no longer than `timeout` allows.
    ///
    /// A free slot is always taken, even when the deadline has already
    /// passed.
    pub fn acquire_timeout(&self, timeout: Timeout) -> Result<Permit<'_>, TimedOut> {
        let mut permits = self.permits();
        while *permits == 0 {
            // Re-read after every wakeup: spurious wakeups and wall clock jumps.
            permits = match timeout.remaining() {
                None => self
                    .available
                    .wait(permits)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(left) if left.is_zero() => {
                    log::trace!("semaphore wait timed out ({timeout:?})");
                    return Err(TimedOut);
                }
                Some(left) => {
                    self.available
                        .wait_timeout(permits, left)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        *permits -= 1;
        Ok(Permit { semaphore: self })
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut permits = self.permits();
        if *permits == 0 {
            return None;
        }
        *permits -= 1;
        Some(Permit { semaphore: self })
    }

    fn release(&self) {
        let mut permits = self.permits();
        debug_assert!(*permits < self.capacity, "released more slots than acquired");
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    // Holders never panic while this lock is held, but a poisoned count is
    // still accurate.
    fn permits(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// One acquired slot. Dropping it releases the slot.
#[must_use = "dropping a permit releases its slot immediately"]
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

impl fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit").finish_non_exhaustive()
    }
}
