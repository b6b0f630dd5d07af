//! Replay playback: load recorded states into a fresh session one per
//! tick. No controller is involved, so playback depends only on the trace.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info, warn};

use quarry_core::Session;
use quarry_replay::{ReplayError, ReplayReader, ReplayTrace};

use crate::executor::Executor;

/// Result of a playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Records loaded into the session.
    pub ticks_replayed: usize,
    /// Lines that were blank or not UTF-8, plus records the session
    /// refused to load.
    pub skipped: usize,
    /// Score after the last loaded record.
    pub final_score: Option<i64>,
    /// Session time after the last loaded record.
    pub final_tick: Option<u64>,
}

impl<S: Session> Executor<S> {
    /// Load the trace at `source` and play it back, sleeping the poll delay
    /// between records and repainting when `visual` is set.
    ///
    /// A trace that cannot be read is logged and returned as an error.
    pub fn replay_game(
        &mut self,
        source: impl AsRef<Path>,
        visual: bool,
    ) -> Result<ReplaySummary, ReplayError> {
        let source = source.as_ref();
        let (trace, unreadable) = read_trace(source).inspect_err(|e| {
            warn!(path = %source.display(), error = %e, "could not load replay");
        })?;
        Ok(self.play(&trace, visual, unreadable))
    }

    /// Play back an in-memory trace.
    pub fn replay_trace(&mut self, trace: &ReplayTrace, visual: bool) -> ReplaySummary {
        self.play(trace, visual, 0)
    }

    fn play(&mut self, trace: &ReplayTrace, visual: bool, unreadable: usize) -> ReplaySummary {
        let mut view = None;
        let mut summary = self.replay_with(trace, |executor, session| {
            if !visual {
                return;
            }
            match view.as_mut() {
                None => {
                    view = executor.open_renderer(session, None, None);
                    if view.is_none() {
                        warn!("visual replay requested without a renderer; playing headless");
                    }
                }
                Some(view) => view.repaint(session),
            }
        });
        summary.skipped += unreadable;
        info!(
            ticks = summary.ticks_replayed,
            skipped = summary.skipped,
            score = ?summary.final_score,
            "replay finished"
        );
        summary
    }

    /// Core playback loop. `observe` is called with each loaded state
    /// after the per-tick sleep.
    pub(crate) fn replay_with(
        &mut self,
        trace: &ReplayTrace,
        mut observe: impl FnMut(&Self, &S),
    ) -> ReplaySummary {
        let mut session = self.setup_session();
        let mut summary = ReplaySummary::default();
        let delay = self.config.polling().delay;
        for (index, record) in trace.iter().enumerate() {
            if let Err(e) = session.load_state(record) {
                debug!(index, error = %e, "skipping replay record");
                summary.skipped += 1;
                continue;
            }
            summary.ticks_replayed += 1;
            summary.final_score = Some(session.score());
            summary.final_tick = Some(session.total_time());
            self.config.clock().sleep(delay);
            observe(self, &session);
        }
        summary
    }
}

/// Read every record at `path`, returning the trace and how many lines the
/// reader skipped.
fn read_trace(path: &Path) -> Result<(ReplayTrace, usize), ReplayError> {
    let mut reader = ReplayReader::new(BufReader::new(File::open(path)?));
    let mut trace = ReplayTrace::new();
    while let Some(record) = reader.next_record()? {
        trace.push(record);
    }
    debug!(
        path = %path.display(),
        records = trace.len(),
        skipped = reader.skipped(),
        "replay loaded"
    );
    Ok((trace, reader.skipped()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use quarry_core::{Renderer, Side};
    use quarry_test_utils::{
        ManualClock, RecordingRenderer, RenderLog, ScriptedHandle, StubMove, StubSession,
    };

    use crate::config::ExecutorConfig;

    fn trace_of(states: &[&str]) -> ReplayTrace {
        states.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn malformed_records_are_skipped() {
        let clock = Arc::new(ManualClock::new());
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(None));
        let trace = trace_of(&["1;1;10;10;-;0;", "garbage", "1;2;20;10;-;0;"]);
        let summary = exec.replay_trace(&trace, false);
        assert_eq!(summary.ticks_replayed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.final_score, Some(20));
        assert_eq!(summary.final_tick, Some(2));
        assert_eq!(clock.total_slept(), Duration::from_millis(80));
    }

    #[test]
    fn visual_replay_shows_then_repaints() {
        let log = Arc::new(RenderLog::default());
        let factory_log = Arc::clone(&log);
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(Arc::new(ManualClock::new()))
            .renderer(move || {
                Box::new(RecordingRenderer::new(Arc::clone(&factory_log)))
                    as Box<dyn Renderer<StubSession>>
            })
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(None));
        let trace = trace_of(&["1;1;10;10;-;0;", "1;2;20;10;-;0;", "1;3;30;10;-;0;"]);
        exec.replay_trace(&trace, true);
        assert_eq!(log.shows(), 1);
        // show paints once, then one repaint per remaining record.
        assert_eq!(log.repaints(), 3);
    }

    #[test]
    fn unreadable_lines_count_as_skipped() {
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(None));
        let path = std::env::temp_dir().join(format!(
            "quarry-engine-{}-unreadable-lines.txt",
            std::process::id()
        ));
        std::fs::write(&path, b"1;1;10;10;-;0;\n\xff\xfe\n\n1;2;20;10;-;0;\n").unwrap();

        let summary = exec.replay_game(&path, false).unwrap();
        assert_eq!(summary.ticks_replayed, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.final_tick, Some(2));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn playback_reproduces_recorded_sequence() {
        let path = std::env::temp_dir().join(format!(
            "quarry-engine-{}-recorded-sequence.txt",
            std::process::id()
        ));
        let clock = Arc::new(ManualClock::new());
        let config = ExecutorConfig::<StubSession>::builder()
            .seed(17)
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(Some(6)));
        let mut entity = ScriptedHandle::new(Side::Entity, StubMove(3), clock.clone());
        let mut group = ScriptedHandle::new(Side::Group, StubMove(-2), clock.clone());
        let run = exec
            .run_game_timed_recorded(&mut entity, &mut group, &path)
            .unwrap();
        assert_eq!(run.trace.len(), 6);

        let mut states = Vec::new();
        let summary = exec.replay_with(&run.trace, |_, session| {
            states.push(session.serialize_state());
        });
        assert_eq!(summary.skipped, 0);
        assert_eq!(states, run.trace.records());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = ExecutorConfig::<StubSession>::builder()
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap();
        let mut exec = Executor::new(config, StubSession::factory(None));
        let path = std::env::temp_dir().join("quarry-engine-no-such-replay.txt");
        let err = exec.replay_game(&path, false).unwrap_err();
        assert!(matches!(err, ReplayError::Io(_)));
    }
}
