//! Replay recording: a fixed-delay threaded run that captures the
//! serialized session after every advance.

use std::path::Path;

use tracing::warn;

use quarry_core::{AsyncController, ControllerError, Session};
use quarry_replay::{save_trace, ReplayTrace};

use crate::executor::{Executor, RunOutcome};
use crate::stats::Stats;
use crate::timed::Pacing;

/// Result of [`Executor::run_game_timed_recorded`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRun {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// The final score as a one-sample [`Stats`].
    pub stats: Stats,
    /// One serialized state per advanced tick, in order.
    pub trace: ReplayTrace,
    /// Whether the trace reached the destination. A failed save is logged
    /// and does not fail the run.
    pub saved: bool,
}

impl<S: Session> Executor<S> {
    /// Run [`run_game_timed`](Executor::run_game_timed) while recording the
    /// session state after every advance, then persist the trace to
    /// `destination` with the configured write mode.
    ///
    /// The trace is saved after both handles have been terminated.
    pub fn run_game_timed_recorded<E, G>(
        &mut self,
        entity: &mut E,
        group: &mut G,
        destination: impl AsRef<Path>,
    ) -> Result<RecordedRun, ControllerError>
    where
        E: AsyncController<S, S::EntityMove> + ?Sized,
        G: AsyncController<S, S::GroupMove> + ?Sized,
    {
        let mut trace = ReplayTrace::new();
        let outcome = self.play_threaded(entity, group, Pacing::FixedDelay, |session| {
            trace.push(session.serialize_state());
        })?;

        let destination = destination.as_ref();
        let saved = match save_trace(destination, &trace, self.config.replay_write_mode()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    path = %destination.display(),
                    error = %e,
                    "could not save replay; continuing without it"
                );
                false
            }
        };

        let mut stats = Stats::new("");
        stats.add(outcome.score as f64);
        Ok(RecordedRun {
            outcome,
            stats,
            trace,
            saved,
        })
    }
}
