//! The external synchronization boundary.
//!
//! Tables and tallies never lock. A `Shared` owns one of them behind a single
//! coarse mutex, and every access, reads and enumeration included, runs with
//! that mutex held. The raw lock type is a parameter so the embedding host
//! can supply its own; `parking_lot::RawMutex` is the default.
//!
//! `EventTotal` is the degraded alternative: no per-key state at all, one
//! relaxed atomic add per event, no lock.

use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::lock_api::{Mutex, MutexGuard, RawMutex};

pub struct Shared<T, R: RawMutex = parking_lot::RawMutex> {
    inner: Mutex<R, T>,
}

impl<T> Shared<T> {
    /// Wrap `value` behind a `parking_lot` mutex.
    pub fn new(value: T) -> Self {
        Self::with_raw_lock(value)
    }
}

impl<T, R: RawMutex> Shared<T, R> {
    /// Wrap `value` behind a mutex built on the raw lock `R`.
    pub fn with_raw_lock(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock. It is held until the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, R, T> {
        self.inner.lock()
    }

    /// Run `f` with the lock held.
    pub fn with<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: core::fmt::Debug, R: RawMutex> core::fmt::Debug for Shared<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Shared").field("inner", &self.inner).finish()
    }
}

/// Lock-free event total for when per-key detail is not wanted.
#[derive(Debug, Default)]
pub struct EventTotal {
    count: AtomicU64,
}

impl EventTotal {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
