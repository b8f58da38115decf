//! Counting barrier
//!
//! A one-shot count-down latch: constructed with the number of completions
//! to expect, released once that many `count_down()` calls have happened.
//! The count never increases and the latch is not reusable.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

/// Blocks waiters until a fixed number of completion signals arrive
#[derive(Debug)]
pub struct CountDownLatch {
    /// Remaining signals before release
    count: Mutex<usize>,

    /// Notified when the count reaches zero
    condvar: Condvar,
}

impl CountDownLatch {
    /// Create a latch expecting `count` signals.
    ///
    /// A latch created with 0 is already released.
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            condvar: Condvar::new(),
        }
    }

    /// Record one completion.
    ///
    /// Safe to call concurrently from any number of threads. Signals beyond
    /// the expected count are ignored (logged); the count saturates at zero.
    pub fn count_down(&self) {
        let mut count = self.lock();
        if *count == 0 {
            warn!("count_down() on a released latch ignored");
            return;
        }

        *count -= 1;
        trace!(remaining = *count, "latch signalled");

        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    /// Block until the count reaches zero. Returns at once if it already has.
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count > 0 {
            trace!(remaining = *count, "waiting on latch");
            count = self
                .condvar
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Signals still outstanding
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Guard that calls [`count_down`](Self::count_down) exactly once when
    /// dropped, including during unwinding.
    pub fn guard(&self) -> LatchGuard<'_> {
        LatchGuard { latch: self }
    }

    // The count is a plain integer, so a panic while holding the lock
    // cannot leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Signals its latch once on drop
#[derive(Debug)]
pub struct LatchGuard<'a> {
    latch: &'a CountDownLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_does_not_block() {
        let latch = CountDownLatch::new(0);
        latch.wait();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_count_down_decrements() {
        let latch = CountDownLatch::new(3);
        latch.count_down();
        assert_eq!(latch.count(), 2);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
        latch.wait();
    }

    #[test]
    fn test_extra_signal_saturates() {
        let latch = CountDownLatch::new(1);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_guard_signals_on_drop() {
        let latch = CountDownLatch::new(2);
        {
            let _guard = latch.guard();
            assert_eq!(latch.count(), 2);
        }
        assert_eq!(latch.count(), 1);
    }

    #[test]
    fn test_guard_signals_during_unwind() {
        let latch = CountDownLatch::new(1);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = latch.guard();
            panic!("worker blew up");
        }));

        assert!(result.is_err());
        assert_eq!(latch.count(), 0);
    }
}
