//! Virtual clock: sleeping advances time instantly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use quarry_core::Clock;

/// A [`Clock`] whose time only moves when something sleeps on it (or a
/// test calls [`advance`](ManualClock::advance)).
///
/// Every loop that sleeps through the harness clock becomes deterministic:
/// a 40 ms tick takes no real time and shows up as exactly 40 ms here.
pub struct ManualClock {
    origin: Instant,
    offset_ns: AtomicU64,
    slept_ns: AtomicU64,
    sleeps: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ns: AtomicU64::new(0),
            slept_ns: AtomicU64::new(0),
            sleeps: AtomicU64::new(0),
        }
    }

    /// Move time forward without counting it as sleep.
    pub fn advance(&self, by: Duration) {
        self.offset_ns.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_ns.load(Ordering::SeqCst))
    }

    /// Total time spent in `sleep`.
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_ns.load(Ordering::SeqCst))
    }

    /// Number of `sleep` calls, including zero-length ones.
    pub fn sleep_calls(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        let ns = duration.as_nanos() as u64;
        self.offset_ns.fetch_add(ns, Ordering::SeqCst);
        self.slept_ns.fetch_add(ns, Ordering::SeqCst);
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}
