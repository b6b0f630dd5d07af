//! Blocking execution: both controllers are called in turn on the calling
//! thread and the session advances once both have answered.
//!
//! The time budget is advisory here. Deadlines are still handed to the
//! controllers, but nothing stops one from overrunning.

use std::time::Duration;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use quarry_core::{Controller, Renderer, Session, Side, TeamController};

use crate::executor::{Executor, RunOutcome, StopReason};

/// What the blocking loop hands each controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Projection {
    /// Per-side projection from the executor's observability flags.
    Configured,
    /// Full clones for both sides.
    FullClone,
}

impl<S: Session> Executor<S> {
    /// Drive `session` to a terminal condition with synchronous calls.
    ///
    /// After each advance the loop sleeps `pause` on the configured clock
    /// (when non-zero) and repaints `view`.
    pub(crate) fn play_blocking<E, G>(
        &self,
        session: &mut S,
        entity: &mut E,
        group: &mut G,
        projection: Projection,
        pause: Duration,
        mut view: Option<&mut Box<dyn Renderer<S>>>,
    ) -> StopReason
    where
        E: Controller<S, S::EntityMove> + ?Sized,
        G: Controller<S, S::GroupMove> + ?Sized,
    {
        loop {
            if let Some(reason) = self.stop_reason(session) {
                return reason;
            }
            self.handle_peek(session);
            let (entity_view, group_view) = match projection {
                Projection::Configured => (
                    self.project(session, Side::Entity),
                    self.project(session, Side::Group),
                ),
                Projection::FullClone => (session.clone(), session.clone()),
            };
            let entity_move = entity.get_move(entity_view, self.deadline());
            let group_move = group.get_move(group_view, self.deadline());
            session.advance(entity_move, group_move);

            if !pause.is_zero() {
                self.config.clock().sleep(pause);
            }
            if let Some(view) = view.as_deref_mut() {
                view.repaint(session);
            }
        }
    }

    /// Play `trials` games back to back with full-clone views and return
    /// the average score.
    ///
    /// Session seeds come from a `ChaCha8Rng` seeded with 0, so the seed
    /// sequence is identical on every call. Returns NaN for zero trials.
    pub fn run_experiment<E, G>(&self, entity: &mut E, group: &mut G, trials: usize) -> f64
    where
        E: Controller<S, S::EntityMove> + ?Sized,
        G: Controller<S, S::GroupMove> + ?Sized,
    {
        let mut seeds = ChaCha8Rng::seed_from_u64(0);
        let mut total = 0.0;
        for trial in 0..trials {
            let mut session = self.new_session(seeds.next_u64());
            self.play_blocking(
                &mut session,
                entity,
                group,
                Projection::FullClone,
                Duration::ZERO,
                None,
            );
            info!(trial, score = session.score(), "trial finished");
            total += session.score() as f64;
        }
        let average = if trials == 0 {
            f64::NAN
        } else {
            total / trials as f64
        };
        info!(trials, average, "experiment finished");
        average
    }

    /// Play one unthreaded game, sleeping `delay` after every tick and
    /// repainting when visuals are on. Returns the final score.
    ///
    /// The group plays a fork of `team` made in the configured
    /// partial-observability mode.
    pub fn run_game<E, T>(&mut self, entity: &mut E, team: &T, delay: Duration) -> RunOutcome
    where
        E: Controller<S, S::EntityMove>,
        T: TeamController<S, S::GroupMove>,
    {
        let (seed, mut session) = self.draw_session();
        let mut view = self.open_view(&session, entity.keyboard_input(), entity.overlay());
        let mut group = self.fork_group(team);
        info!(mode = "blocking", seed, "run started");
        let reason = self.play_blocking(
            &mut session,
            entity,
            &mut group,
            Projection::Configured,
            delay,
            view.as_mut(),
        );
        let outcome = RunOutcome::of(&session, reason);
        info!(score = outcome.score, ticks = outcome.ticks, %reason, "run finished");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use quarry_core::{Clock, Deadline};
    use quarry_test_utils::{
        FixedController, KeyboardController, ManualClock, RecordingController, RecordingRenderer,
        RenderLog, StubMove, StubSession,
    };

    use crate::config::ExecutorConfig;

    #[test]
    fn run_game_sleeps_delay_each_tick() {
        let clock = Arc::new(ManualClock::new());
        let config = ExecutorConfig::<StubSession>::builder()
            .seed(1)
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(6)));
        let mut entity = FixedController::new(StubMove(1));
        let team = FixedController::new(StubMove(0));
        let outcome = exec.run_game(&mut entity, &team, Duration::from_millis(25));
        assert_eq!(outcome.ticks, 6);
        assert_eq!(outcome.reason, StopReason::GameOver);
        assert_eq!(clock.total_slept(), Duration::from_millis(150));
        assert_eq!(entity.calls(), 6);
        assert_eq!(team.fork_flags(), vec![true]);
    }

    #[test]
    fn run_game_views_follow_flags() {
        let config = ExecutorConfig::<StubSession>::builder()
            .seed(1)
            .entity_partial_observability(true)
            .group_partial_observability(false)
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(3)));
        let mut entity = RecordingController::<StubSession, StubMove>::new(StubMove(0));
        let team = RecordingController::<StubSession, StubMove>::new(StubMove(0));
        let entity_views = entity.views();
        let group_views = team.views();
        exec.run_game(&mut entity, &team, Duration::ZERO);

        let entity_views = entity_views.lock().unwrap();
        let group_views = group_views.lock().unwrap();
        assert_eq!(entity_views.len(), 3);
        assert!(entity_views.iter().all(|v| v.viewer() == Some(Side::Entity)));
        assert!(group_views.iter().all(|v| v.viewer().is_none()));
        // Views are taken before each advance: ticks 0, 1, 2.
        let ticks: Vec<u64> = entity_views.iter().map(|v| v.total_time()).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }

    #[test]
    fn run_experiment_averages_with_fixed_seed_sequence() {
        let config = ExecutorConfig::<StubSession>::builder().build().unwrap();
        let exec = Executor::new(config, StubSession::factory(Some(4)));
        let mut entity = FixedController::new(StubMove(0));
        let mut group = FixedController::new(StubMove(0));
        // Ten points per tick, four ticks.
        assert_eq!(exec.run_experiment(&mut entity, &mut group, 3), 40.0);
        assert!(exec.run_experiment(&mut entity, &mut group, 0).is_nan());
    }

    #[test]
    fn run_experiment_uses_full_clones() {
        let config = ExecutorConfig::<StubSession>::builder().build().unwrap();
        let exec = Executor::new(config, StubSession::factory(Some(2)));
        let mut entity = RecordingController::<StubSession, StubMove>::new(StubMove(0));
        let mut group = RecordingController::<StubSession, StubMove>::new(StubMove(0));
        let views = entity.views();
        exec.run_experiment(&mut entity, &mut group, 1);
        assert!(views.lock().unwrap().iter().all(|v| v.viewer().is_none()));
    }

    #[test]
    fn run_game_wires_keyboard_and_overlay() {
        let log = Arc::new(RenderLog::default());
        let factory_log = Arc::clone(&log);
        let config = ExecutorConfig::<StubSession>::builder()
            .seed(2)
            .visuals(true)
            .scale_factor(2.0)
            .renderer(move || {
                Box::new(RecordingRenderer::new(Arc::clone(&factory_log)))
                    as Box<dyn Renderer<StubSession>>
            })
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(3)));
        let mut entity = KeyboardController::new();
        let team = FixedController::new(StubMove(0));
        exec.run_game(&mut entity, &team, Duration::ZERO);

        assert_eq!(log.shows(), 1);
        // One repaint from show, one per tick.
        assert_eq!(log.repaints(), 4);
        assert_eq!(log.drawables(), 1);
        assert_eq!(log.inputs().len(), 1);
        assert_eq!(log.overlay_primitives(), 4);
        let settings = log.settings().unwrap();
        assert!(settings.entity_point_of_view);
        assert_eq!(settings.scale_factor, 2.0);
    }

    #[test]
    fn deadlines_use_time_budget() {
        struct DeadlineProbe(Arc<ManualClock>, Vec<Duration>);
        impl Controller<StubSession, StubMove> for DeadlineProbe {
            fn get_move(&mut self, _view: StubSession, deadline: Deadline) -> StubMove {
                self.1.push(deadline.remaining(self.0.now()));
                StubMove(0)
            }
        }
        let clock = Arc::new(ManualClock::new());
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(clock.clone())
            .time_budget(Duration::from_millis(15))
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(2)));
        let mut probe = DeadlineProbe(Arc::clone(&clock), Vec::new());
        exec.run_game(&mut probe, &FixedController::new(StubMove(0)), Duration::ZERO);
        assert_eq!(probe.1, vec![Duration::from_millis(15); 2]);
    }
}
