//! Trial batch runner: independent blocking trials aggregated into score
//! and tick-count statistics.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use quarry_core::{Controller, Session, TeamController};

use crate::blocking::Projection;
use crate::executor::Executor;
use crate::handle::panic_message;
use crate::stats::Stats;

/// Aggregated result of [`Executor::run_experiment_ticks`].
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport {
    /// Final score of every completed trial.
    pub scores: Stats,
    /// Ticks advanced in every completed trial.
    pub ticks: Stats,
    /// Trials abandoned because a controller panicked.
    pub failed_trials: usize,
}

impl<S: Session> Executor<S> {
    /// Run `trials` independent blocking games back to back.
    ///
    /// Every trial gets a fresh session and a fresh fork of `team` in the
    /// configured partial-observability mode; nothing but the accumulators
    /// carries over. A trial whose controller panics is logged, counted in
    /// [`BatchReport::failed_trials`], and left out of the statistics.
    /// Both accumulators record the batch's total wall time.
    pub fn run_experiment_ticks<E, T>(
        &mut self,
        entity: &mut E,
        team: &T,
        trials: usize,
        description: &str,
    ) -> BatchReport
    where
        E: Controller<S, S::EntityMove>,
        T: TeamController<S, S::GroupMove>,
    {
        let mut scores = Stats::new(description);
        let mut ticks = Stats::new(description);
        let mut failed_trials = 0;

        let clock = Arc::clone(self.config.clock());
        let started = clock.now();
        info!(trials, description, "batch started");
        for trial in 0..trials {
            let mut session = self.setup_session();
            let mut group = self.fork_group(team);
            let played = catch_unwind(AssertUnwindSafe(|| {
                self.play_blocking(
                    &mut session,
                    entity,
                    &mut group,
                    Projection::Configured,
                    Duration::ZERO,
                    None,
                )
            }));
            match played {
                Ok(_) => {
                    scores.add(session.score() as f64);
                    ticks.add(session.total_time() as f64);
                }
                Err(payload) => {
                    warn!(
                        trial,
                        panic = panic_message(payload.as_ref()),
                        "trial failed; continuing with the rest of the batch"
                    );
                    failed_trials += 1;
                }
            }
        }
        let ms = clock.now().saturating_duration_since(started).as_millis() as u64;
        scores.set_ms_taken(ms);
        ticks.set_ms_taken(ms);
        info!(
            description,
            mean_score = scores.mean(),
            mean_ticks = ticks.mean(),
            failed_trials,
            ms,
            "batch finished"
        );

        BatchReport {
            scores,
            ticks,
            failed_trials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    use quarry_core::{Clock, Deadline, ObservabilityPolicy};
    use quarry_test_utils::{
        FixedController, ManualClock, PanickingController, StubMessenger, StubMove, StubSession,
    };

    use crate::config::ExecutorConfig;

    /// Sessions scoring their own trial index and ending after one tick.
    fn indexed_factory(
    ) -> impl Fn(u64, &ObservabilityPolicy, Option<StubMessenger>) -> StubSession + Send + Sync + 'static
    {
        let next = AtomicI64::new(0);
        move |seed, policy, messenger| {
            let index = next.fetch_add(1, Ordering::SeqCst);
            StubSession::new(seed, *policy, messenger)
                .with_score(index)
                .scoring(0)
                .ending_at(Some(1))
        }
    }

    #[test]
    fn ten_trials_scoring_their_index() {
        let config = ExecutorConfig::<StubSession>::builder().seed(42).build().unwrap();
        let mut exec = Executor::new(config, indexed_factory());
        let mut entity = FixedController::new(StubMove(0));
        let team = FixedController::new(StubMove(0));
        let report = exec.run_experiment_ticks(&mut entity, &team, 10, "indexed");
        assert_eq!(report.scores.n(), 10);
        assert_eq!(report.scores.mean(), 4.5);
        assert_eq!(report.scores.min(), 0.0);
        assert_eq!(report.scores.max(), 9.0);
        assert_eq!(report.ticks.mean(), 1.0);
        assert_eq!(report.failed_trials, 0);
        assert_eq!(report.scores.description(), "indexed");
        // One fork per trial.
        assert_eq!(team.fork_flags().len(), 10);
    }

    #[test]
    fn panicking_trial_is_isolated() {
        let config = ExecutorConfig::<StubSession>::builder().seed(1).build().unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(3)));
        // Panics on the fifth call: the second trial's second tick.
        let mut entity = PanickingController::new(StubMove(0), 5);
        let team = FixedController::new(StubMove(0));
        let report = exec.run_experiment_ticks(&mut entity, &team, 4, "isolated");
        assert_eq!(report.failed_trials, 1);
        assert_eq!(report.scores.n(), 3);
        assert_eq!(report.ticks.mean(), 3.0);
    }

    #[test]
    fn batch_wall_time_uses_configured_clock() {
        struct Slow(Arc<ManualClock>);
        impl Controller<StubSession, StubMove> for Slow {
            fn get_move(&mut self, _view: StubSession, _deadline: Deadline) -> StubMove {
                self.0.sleep(Duration::from_millis(10));
                StubMove(0)
            }
        }
        let clock = Arc::new(ManualClock::new());
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(2)));
        let mut entity = Slow(Arc::clone(&clock));
        let team = FixedController::new(StubMove(0));
        let report = exec.run_experiment_ticks(&mut entity, &team, 3, "timed");
        assert_eq!(report.scores.ms_taken(), 60);
        assert_eq!(report.ticks.ms_taken(), 60);
    }
}
