// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! GuardedValue<V>: a value that is only reachable through a semaphore.
//!
//! Every accessor takes a slot first and gives it back on every exit path.
//! Closure-based access keeps read-modify-write cycles inside one critical
//! section; a `get` followed by a `set` is two sections and can race.

use std::fmt;
use std::ptr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use crate::semaphore::Semaphore;
use crate::timeout::{TimedOut, Timeout};

/// A thread-safe variable.
///
/// With the default capacity of 1 every operation is serialized. With a
/// larger capacity up to that many holders are admitted together; read-only
/// operations (`get`, `access`) then run side by side while writing
/// operations still exclude everyone else.
///
/// # Escaping handles
///
/// `get` hands out a clone. If `V` shares state by reference (`Arc`, `Rc`,
/// cells), mutations made through that clone are not covered by the guard.
/// Keeping such handles in sync is up to the caller.
///
/// # Deadlocks
///
/// Acquisition is not reentrant. Calling a blocking accessor of the same
/// guard from inside one of its closures deadlocks once all slots are taken.
pub struct GuardedValue<V> {
    value: RwLock<V>,
    semaphore: Semaphore,
}

impl<V> GuardedValue<V> {
    /// Guard `value` with a fresh binary semaphore.
    pub fn new(value: V) -> Self {
        Self::with_semaphore(value, Semaphore::new(1))
    }

    /// Guard `value`, admitting up to `capacity` holders at once.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(value: V, capacity: usize) -> Self {
        Self::with_semaphore(value, Semaphore::new(capacity))
    }

    /// Guard `value` with a semaphore the caller already built.
    pub fn with_semaphore(value: V, semaphore: Semaphore) -> Self {
        Self {
            value: RwLock::new(value),
            semaphore,
        }
    }

    pub fn capacity(&self) -> usize {
        self.semaphore.capacity()
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> V
    where
        V: Clone,
    {
        self.access(V::clone)
    }

    /// Overwrite the value.
    pub fn set(&self, value: V) {
        drop(self.replace(value));
    }

    /// Overwrite the value, returning the previous one.
    pub fn replace(&self, value: V) -> V {
        let _permit = self.semaphore.acquire();
        let mut current = self.write();
        std::mem::replace(&mut *current, value)
    }

    /// Store the result of `producer`, computed while the slot is held.
    pub fn set_with<F: FnOnce() -> V>(&self, producer: F) {
        let _permit = self.semaphore.acquire();
        self.store(producer);
    }

    /// Run `op` against the current value.
    pub fn access<R, F: FnOnce(&V) -> R>(&self, op: F) -> R {
        let _permit = self.semaphore.acquire();
        let value = self.read();
        op(&value)
    }

    /// Replace the value with `op(&current)` in one critical section.
    ///
    /// If `op` panics the stored value is left as it was.
    pub fn mutate<F: FnOnce(&V) -> V>(&self, op: F) {
        let _permit = self.semaphore.acquire();
        Self::rewrite(&mut self.write(), op);
    }

    /// Modify the value in place in one critical section.
    pub fn update<R, F: FnOnce(&mut V) -> R>(&self, op: F) -> R {
        let _permit = self.semaphore.acquire();
        let mut value = self.write();
        op(&mut value)
    }

    /// Run `op` inside the critical section without touching the value.
    pub fn run<R, F: FnOnce() -> R>(&self, op: F) -> R {
        let _permit = self.semaphore.acquire();
        op()
    }

    /// `access`, giving up at `timeout`. On `Err` the closure never ran.
    pub fn access_timeout<R, F: FnOnce(&V) -> R>(
        &self,
        timeout: Timeout,
        op: F,
    ) -> Result<R, TimedOut> {
        let _permit = self.semaphore.acquire_timeout(timeout)?;
        let value = self.read();
        Ok(op(&value))
    }

    /// `set_with`, giving up at `timeout`. On `Err` the producer never ran.
    pub fn set_timeout<F: FnOnce() -> V>(
        &self,
        timeout: Timeout,
        producer: F,
    ) -> Result<(), TimedOut> {
        let _permit = self.semaphore.acquire_timeout(timeout)?;
        self.store(producer);
        Ok(())
    }

    /// `mutate`, giving up at `timeout`. On `Err` the value is untouched.
    pub fn mutate_timeout<F: FnOnce(&V) -> V>(
        &self,
        timeout: Timeout,
        op: F,
    ) -> Result<(), TimedOut> {
        let _permit = self.semaphore.acquire_timeout(timeout)?;
        Self::rewrite(&mut self.write(), op);
        Ok(())
    }

    /// `update`, giving up at `timeout`.
    pub fn update_timeout<R, F: FnOnce(&mut V) -> R>(
        &self,
        timeout: Timeout,
        op: F,
    ) -> Result<R, TimedOut> {
        let _permit = self.semaphore.acquire_timeout(timeout)?;
        let mut value = self.write();
        Ok(op(&mut value))
    }

    /// `run`, giving up at `timeout`.
    pub fn run_timeout<R, F: FnOnce() -> R>(
        &self,
        timeout: Timeout,
        op: F,
    ) -> Result<R, TimedOut> {
        let _permit = self.semaphore.acquire_timeout(timeout)?;
        Ok(op())
    }

    /// `access` only if the value is free right now.
    pub fn try_access<R, F: FnOnce(&V) -> R>(&self, op: F) -> Option<R> {
        let _permit = self.semaphore.try_acquire()?;
        let value = match self.value.try_read() {
            Ok(value) => value,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(op(&value))
    }

    /// `mutate` only if the value is free right now.
    ///
    /// Returns whether `op` ran.
    pub fn try_mutate<F: FnOnce(&V) -> V>(&self, op: F) -> bool {
        let Some(_permit) = self.semaphore.try_acquire() else {
            return false;
        };
        let mut value = match self.value.try_write() {
            Ok(value) => value,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        Self::rewrite(&mut value, op);
        true
    }

    /// Direct access; `&mut self` already rules out other holders.
    pub fn get_mut(&mut self) -> &mut V {
        self.value.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> V {
        self.value.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` on both values inside one critical section spanning both
    /// guards.
    ///
    /// Slots are taken in address order so that concurrent `a op b` and
    /// `b op a` cannot deadlock each other.
    pub(crate) fn access_both<R, F: FnOnce(&V, &V) -> R>(&self, other: &Self, op: F) -> R {
        if ptr::eq(self, other) {
            return self.access(|value| op(value, value));
        }
        let (first, second) = if (self as *const Self) < (other as *const Self) {
            (self, other)
        } else {
            (other, self)
        };
        let _first_permit = first.semaphore.acquire();
        let _second_permit = second.semaphore.acquire();
        let first_value = first.read();
        let second_value = second.read();
        if ptr::eq(first, self) {
            op(&first_value, &second_value)
        } else {
            op(&second_value, &first_value)
        }
    }

    fn store<F: FnOnce() -> V>(&self, producer: F) {
        let value = producer();
        *self.write() = value;
    }

    fn rewrite<F: FnOnce(&V) -> V>(value: &mut V, op: F) {
        let next = op(value);
        *value = next;
    }

    // A closure that panicked while holding the lock leaves it poisoned; the
    // value is still whole, so carry on with it.
    fn read(&self) -> RwLockReadGuard<'_, V> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, V> {
        self.value.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Default> Default for GuardedValue<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V> From<V> for GuardedValue<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

/// Clones get their own semaphore with the same capacity.
impl<V: Clone> Clone for GuardedValue<V> {
    fn clone(&self) -> Self {
        Self::with_capacity(self.get(), self.capacity())
    }
}

impl<V: fmt::Debug> fmt::Debug for GuardedValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("GuardedValue");
        let shown = self.try_access(|value| {
            d.field("value", value);
        });
        if shown.is_none() {
            d.field("value", &format_args!("<locked>"));
        }
        d.field("capacity", &self.capacity()).finish()
    }
}
