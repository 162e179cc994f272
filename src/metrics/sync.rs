//! Lock-free float cell and poison-tolerant lock accessors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An `f64` stored as its bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub(crate) fn new(value: f64) -> Self {
        AtomicF64 {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Adds `delta` with a compare-and-swap loop so concurrent adds are never lost.
    pub(crate) fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

// Critical sections in the metrics core never panic half-way through an update,
// so a poisoned lock still guards consistent data.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::AtomicF64;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_adds_are_not_lost() {
        let cell = Arc::new(AtomicF64::new(0.0));
        thread::scope(|s| {
            for _ in 0..8 {
                let cell = cell.clone();
                s.spawn(move || {
                    for _ in 0..10_000 {
                        cell.add(0.5);
                    }
                });
            }
        });
        assert_eq!(cell.get(), 40_000.0);
    }

    #[test]
    fn set_overwrites_value() {
        let cell = AtomicF64::new(3.0);
        cell.set(-1.25);
        assert_eq!(cell.get(), -1.25);
    }
}
