// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Guarded values: a thread-safe variable without a hand-paired lock.
//!
//! `GuardedValue<V>` owns a value and a counting semaphore (capacity 1 by
//! default). Every read and write goes through the semaphore, either blocking
//! until a slot frees up or giving up at a `Timeout`. A timed-out operation
//! did not happen: its closure never ran and the value is unchanged.
//!
//! Components:
//! - semaphore — blocking counting semaphore with RAII permits
//! - timeout — deadlines and the `TimedOut` error
//! - guarded — the `GuardedValue` accessor
//! - cmp — equality/ordering/hashing by wrapped value
//! - serialize — serde support (`serde` feature)
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! use guarded::{GuardedValue, Timeout};
//!
//! let hits = Arc::new(GuardedValue::new(0u32));
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let hits = hits.clone();
//!         thread::spawn(move || hits.mutate(|n| n + 1))
//!     })
//!     .collect();
//! for w in workers {
//!     w.join().unwrap();
//! }
//! assert_eq!(hits.get(), 4);
//!
//! let seen = hits.access_timeout(Timeout::after(Duration::from_millis(10)), |n| *n);
//! assert_eq!(seen, Ok(4));
//! ```

mod cmp;
pub mod guarded;
pub mod semaphore;
#[cfg(feature = "serde")]
mod serialize;
pub mod timeout;

pub use guarded::GuardedValue;
pub use semaphore::{Permit, Semaphore};
pub use timeout::{TimedOut, Timeout};
