//! Speed-optimised pacing: poll both handles every `W` and advance as soon
//! as both are ready, instead of always sleeping the full delay `D`.

use std::time::Duration;

use quarry_core::{AsyncController, Clock, ControllerError, Session};

use crate::config::PollingConfig;
use crate::executor::Executor;
use crate::stats::Stats;
use crate::timed::Pacing;

/// What one tick's polling did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOutcome {
    /// Polls performed (1-based; at most `D / W`).
    pub polls: u32,
    /// Whether readiness was observed before `D` ran out.
    pub ready: bool,
    /// Extra sleep added to pad the tick to `D`.
    pub padded: Duration,
}

/// Sleep `W`, then check `ready`, up to `D / W` times. Stops at the first
/// poll where `ready` holds. With `fixed_time` the remaining
/// `(D / W - polls) * W` is slept afterwards, so the tick always takes
/// exactly `D` on `clock`.
pub fn poll_until_ready(
    clock: &dyn Clock,
    polling: &PollingConfig,
    fixed_time: bool,
    mut ready: impl FnMut() -> bool,
) -> PollOutcome {
    let budget = polling.polls_per_tick();
    let mut polls = 0;
    let mut observed = false;
    while polls < budget {
        clock.sleep(polling.interval);
        polls += 1;
        if ready() {
            observed = true;
            break;
        }
    }
    let padded = if fixed_time {
        polling.interval * (budget - polls)
    } else {
        Duration::ZERO
    };
    if !padded.is_zero() {
        clock.sleep(padded);
    }
    PollOutcome {
        polls,
        ready: observed,
        padded,
    }
}

impl<S: Session> Executor<S> {
    /// Threaded run that advances as soon as both handles report ready,
    /// or after `D` when they do not. With `fixed_time` every tick is
    /// padded to exactly `D`.
    ///
    /// Returns a [`Stats`] labelled `description` holding the final score.
    pub fn run_game_timed_speed_optimised<E, G>(
        &mut self,
        entity: &mut E,
        group: &mut G,
        fixed_time: bool,
        description: &str,
    ) -> Result<Stats, ControllerError>
    where
        E: AsyncController<S, S::EntityMove> + ?Sized,
        G: AsyncController<S, S::GroupMove> + ?Sized,
    {
        let outcome = self.play_threaded(entity, group, Pacing::Polling { fixed_time }, |_| {})?;
        let mut stats = Stats::new(description);
        stats.add(outcome.score as f64);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use quarry_test_utils::ManualClock;

    fn polling(d: u64, w: u64) -> PollingConfig {
        PollingConfig::new(Duration::from_millis(d), Duration::from_millis(w))
    }

    #[test]
    fn stops_at_first_ready_poll() {
        let clock = ManualClock::new();
        let calls = Cell::new(0);
        let outcome = poll_until_ready(&clock, &polling(40, 5), false, || {
            calls.set(calls.get() + 1);
            calls.get() == 2
        });
        assert_eq!(outcome.polls, 2);
        assert!(outcome.ready);
        assert_eq!(outcome.padded, Duration::ZERO);
        assert_eq!(clock.elapsed(), Duration::from_millis(10));
    }

    #[test]
    fn never_ready_takes_full_delay() {
        let clock = ManualClock::new();
        let outcome = poll_until_ready(&clock, &polling(40, 5), false, || false);
        assert_eq!(outcome.polls, 8);
        assert!(!outcome.ready);
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn fixed_time_pads_to_delay() {
        let clock = ManualClock::new();
        let outcome = poll_until_ready(&clock, &polling(40, 5), true, || true);
        assert_eq!(outcome.polls, 1);
        assert_eq!(outcome.padded, Duration::from_millis(35));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn fixed_time_without_readiness_adds_nothing() {
        let clock = ManualClock::new();
        let outcome = poll_until_ready(&clock, &polling(40, 5), true, || false);
        assert_eq!(outcome.padded, Duration::ZERO);
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        assert_eq!(clock.sleep_calls(), 8);
    }
}
