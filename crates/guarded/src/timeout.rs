// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bounded waits.
//!
//! A `Timeout` says how long an acquire may block. Monotonic deadlines ignore
//! clock adjustments; wall-clock deadlines follow the system clock and are
//! re-read after every wakeup.

use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;

/// How long a bounded operation may wait for a free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Block until a slot is free.
    #[default]
    Never,
    /// Give up once the monotonic clock reaches this instant.
    Deadline(Instant),
    /// Give up once the system clock reaches this time.
    WallClock(SystemTime),
}

impl Timeout {
    /// Monotonic deadline `duration` from now.
    ///
    /// A duration too large to represent as an `Instant` waits forever.
    pub fn after(duration: Duration) -> Self {
        match Instant::now().checked_add(duration) {
            Some(deadline) => Timeout::Deadline(deadline),
            None => Timeout::Never,
        }
    }

    /// A deadline that has already passed: take a free slot or give up.
    pub fn immediate() -> Self {
        Timeout::Deadline(Instant::now())
    }

    /// Time left before the deadline. `None` means no deadline at all.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        match *self {
            Timeout::Never => None,
            Timeout::Deadline(deadline) => {
                Some(deadline.saturating_duration_since(Instant::now()))
            }
            Timeout::WallClock(deadline) => Some(
                deadline
                    .duration_since(SystemTime::now())
                    .unwrap_or(Duration::ZERO),
            ),
        }
    }
}

impl From<Instant> for Timeout {
    fn from(deadline: Instant) -> Self {
        Timeout::Deadline(deadline)
    }
}

impl From<SystemTime> for Timeout {
    fn from(deadline: SystemTime) -> Self {
        Timeout::WallClock(deadline)
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::after(duration)
    }
}

/// The deadline passed before a slot was acquired. The operation did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out waiting for guarded value")]
pub struct TimedOut;
