use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction shared by the session runner and the trainer.
///
/// - now(): returns a monotonic Instant
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - secs_since(): elapsed seconds from an anchor Instant, used to timestamp samples
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }

    /// Fractional seconds elapsed since `epoch`, saturating at 0.0 on underflow.
    fn secs_since(&self, epoch: Instant) -> f64 {
        self.now().saturating_duration_since(epoch).as_secs_f64()
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// now() = origin + offset
    /// sleep(d) advances internal time by d without actually sleeping.
    /// Clones share the same offset, so a test can keep a handle while the
    /// trainer owns another.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Advance by fractional seconds.
        pub fn advance_secs(&self, secs: f64) {
            self.advance(Duration::from_secs_f64(secs));
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.origin + off
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn test_clock_shares_offset_between_clones() {
        let clock = TestClock::new();
        let handle = clock.clone();
        let epoch = clock.now();
        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.ms_since(epoch), 1500);
        assert!((clock.secs_since(epoch) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn elapsed_saturates_for_future_epoch() {
        let clock = TestClock::new();
        let future = clock.now() + Duration::from_secs(5);
        assert_eq!(clock.ms_since(future), 0);
        assert_eq!(clock.secs_since(future), 0.0);
    }
}
