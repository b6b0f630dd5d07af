//! Wall-clock abstraction and decision deadlines.
//!
//! Every sleep and every "now" in the harness goes through a [`Clock`],
//! so loops can be driven by a virtual clock in tests. Deadlines handed to
//! agents are explicit points in time, never an implicit global.

use std::fmt;
use std::time::{Duration, Instant};

/// Source of time and sleeping for the stepper thread.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// The instant by which an agent's decision is expected.
///
/// Advisory only: nothing preempts an agent that overruns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline at an absolute instant.
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// A deadline `budget` after the clock's current instant.
    pub fn after(clock: &dyn Clock, budget: Duration) -> Self {
        Self(clock.now() + budget)
    }

    /// The absolute instant.
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before the deadline, saturating at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.0.saturating_duration_since(now)
    }

    /// Whether `now` is at or past the deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.0
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deadline at {:?}", self.0)
    }
}
