//! Threaded execution: both controllers run as long-lived asynchronous
//! handles and the stepper paces ticks in real time.
//!
//! # Architecture
//!
//! ```text
//! Stepper thread                     Entity handle        Group handle
//!     | start() ------------------------->|                    |
//!     | start() ---------------------------------------------->|
//!     | loop:                             |                    |
//!     |   stop_reason()? -> break         |                    |
//!     |   peek(session)                   |                    |
//!     |   update(project(Entity), dl) --->|                    |
//!     |   update(project(Group), dl) ------------------------->|
//!     |   pace: sleep(D) | poll every W   |                    |
//!     |   advance(get_move(), get_move())<-|<-------------------|
//!     |   on_advance(session), repaint    |                    |
//!     | guards drop: terminate() -------->|------------------->|
//! ```
//!
//! Both updates are issued before the session advances, and every view is
//! taken from the post-advance state of the previous tick.

use tracing::{debug, info};

use quarry_core::{AsyncController, ControllerError, Session, Side};

use crate::executor::{Executor, RunOutcome};
use crate::guard::TerminateGuard;
use crate::speed::poll_until_ready;

/// How the stepper waits between issuing updates and advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pacing {
    /// Sleep the full poll delay `D`.
    FixedDelay,
    /// Poll readiness every `W`, leaving early once both sides are ready
    /// unless `fixed_time` pads the tick back to `D`.
    Polling {
        /// Pad every tick to exactly `D`.
        fixed_time: bool,
    },
}

impl<S: Session> Executor<S> {
    /// Shared threaded loop. Starts both handles, runs to a terminal
    /// condition, and terminates both handles exactly once on every exit
    /// path. `on_advance` sees the session after each advance.
    pub(crate) fn play_threaded<E, G>(
        &mut self,
        entity: &mut E,
        group: &mut G,
        pacing: Pacing,
        mut on_advance: impl FnMut(&S),
    ) -> Result<RunOutcome, ControllerError>
    where
        E: AsyncController<S, S::EntityMove> + ?Sized,
        G: AsyncController<S, S::GroupMove> + ?Sized,
    {
        let mut entity = TerminateGuard::new(entity);
        let mut group = TerminateGuard::new(group);

        let (seed, mut session) = self.draw_session();
        let mut view = self.open_view(&session, entity.keyboard_input(), entity.overlay());

        entity.start()?;
        group.start()?;
        info!(mode = ?pacing, seed, "run started");

        let polling = self.config.polling();
        let reason = loop {
            if let Some(reason) = self.stop_reason(&session) {
                break reason;
            }
            self.handle_peek(&session);

            let deadline = self.deadline();
            entity.update(self.project(&session, Side::Entity), deadline);
            group.update(self.project(&session, Side::Group), deadline);

            match pacing {
                Pacing::FixedDelay => self.config.clock().sleep(polling.delay),
                Pacing::Polling { fixed_time } => {
                    let outcome = poll_until_ready(
                        self.config.clock().as_ref(),
                        &polling,
                        fixed_time,
                        || entity.has_computed() && group.has_computed(),
                    );
                    debug!(
                        tick = session.total_time(),
                        polls = outcome.polls,
                        ready = outcome.ready,
                        padded_ms = outcome.padded.as_millis() as u64,
                        "tick paced"
                    );
                }
            }

            session.advance(entity.get_move(), group.get_move());
            on_advance(&session);
            if let Some(view) = view.as_mut() {
                view.repaint(&session);
            }
        };

        let outcome = RunOutcome::of(&session, reason);
        info!(score = outcome.score, ticks = outcome.ticks, %reason, "run finished");
        Ok(outcome)
    }

    /// Real-time run: each tick both handles get their view, the stepper
    /// sleeps the poll delay `D`, then advances with whatever moves the
    /// handles hold.
    pub fn run_game_timed<E, G>(
        &mut self,
        entity: &mut E,
        group: &mut G,
    ) -> Result<RunOutcome, ControllerError>
    where
        E: AsyncController<S, S::EntityMove> + ?Sized,
        G: AsyncController<S, S::GroupMove> + ?Sized,
    {
        self.play_threaded(entity, group, Pacing::FixedDelay, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use quarry_test_utils::{ManualClock, ScriptedHandle, StubMove, StubSession};

    use crate::config::{ExecutorConfig, PollingConfig};
    use crate::executor::StopReason;

    fn executor(
        clock: &Arc<ManualClock>,
        end_at: Option<u64>,
        limit: Option<u64>,
    ) -> Executor<StubSession> {
        let config = ExecutorConfig::<StubSession>::builder()
            .seed(11)
            .clock(clock.clone())
            .tick_limit(limit)
            .polling(PollingConfig::new(
                Duration::from_millis(40),
                Duration::from_millis(5),
            ))
            .build()
            .unwrap();
        Executor::new(config, StubSession::factory(end_at))
    }

    #[test]
    fn fixed_delay_per_tick() {
        let clock = Arc::new(ManualClock::new());
        let mut exec = executor(&clock, Some(5), None);
        let mut entity = ScriptedHandle::new(Side::Entity, StubMove(1), clock.clone());
        let mut group = ScriptedHandle::new(Side::Group, StubMove(0), clock.clone());
        let outcome = exec.run_game_timed(&mut entity, &mut group).unwrap();
        assert_eq!(outcome.ticks, 5);
        assert_eq!(outcome.reason, StopReason::GameOver);
        assert_eq!(clock.total_slept(), Duration::from_millis(200));
        assert_eq!(entity.counters().updates(), 5);
        assert_eq!(group.counters().move_reads(), 5);
    }

    #[test]
    fn start_failure_still_terminates_both() {
        let clock = Arc::new(ManualClock::new());
        let mut exec = executor(&clock, Some(5), None);
        let mut entity = ScriptedHandle::new(Side::Entity, StubMove(0), clock.clone());
        let mut group =
            ScriptedHandle::new(Side::Group, StubMove(0), clock.clone()).failing_start();
        let err = exec.run_game_timed(&mut entity, &mut group).unwrap_err();
        assert!(matches!(err, ControllerError::SpawnFailed { side: Side::Group, .. }));
        assert_eq!(entity.counters().terminates(), 1);
        assert_eq!(group.counters().terminates(), 1);
        assert_eq!(entity.counters().updates(), 0);
    }

    #[test]
    fn handles_can_be_trait_objects() {
        let clock = Arc::new(ManualClock::new());
        let mut exec = executor(&clock, None, Some(3));
        let mut entity: Box<dyn AsyncController<StubSession, StubMove>> =
            Box::new(ScriptedHandle::new(Side::Entity, StubMove(0), clock.clone()));
        let mut group: Box<dyn AsyncController<StubSession, StubMove>> =
            Box::new(ScriptedHandle::new(Side::Group, StubMove(0), clock.clone()));
        let outcome = exec
            .run_game_timed(entity.as_mut(), group.as_mut())
            .unwrap();
        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.reason, StopReason::TickLimit);
    }
}
