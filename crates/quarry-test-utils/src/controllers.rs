//! Scripted controllers and asynchronous handles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use quarry_core::{
    AsyncController, Clock, Controller, ControllerError, Deadline, Drawable, HandleLifecycle,
    InputSink, Key, OverlayLayer, OverlayPrimitive, Rgb, Side, TeamController,
};

use crate::clock::ManualClock;

// ── FixedController ─────────────────────────────────────────────

/// Always answers with the same move and counts calls.
///
/// Forks share the call counter and record the `partial_observability`
/// flag they were forked with.
#[derive(Clone)]
pub struct FixedController<M> {
    mv: M,
    think: Option<(Arc<dyn Clock>, Duration)>,
    calls: Arc<AtomicUsize>,
    forks: Arc<Mutex<Vec<bool>>>,
}

impl<M> FixedController<M> {
    pub fn new(mv: M) -> Self {
        Self {
            mv,
            think: None,
            calls: Arc::new(AtomicUsize::new(0)),
            forks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep `duration` on `clock` before answering.
    pub fn thinking(mut self, clock: Arc<dyn Clock>, duration: Duration) -> Self {
        self.think = Some((clock, duration));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Flags passed to every `fork` so far, in order.
    pub fn fork_flags(&self) -> Vec<bool> {
        self.forks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<V, M: Clone + Send + 'static> Controller<V, M> for FixedController<M> {
    fn get_move(&mut self, _view: V, _deadline: Deadline) -> M {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((clock, duration)) = &self.think {
            clock.sleep(*duration);
        }
        self.mv.clone()
    }
}

impl<V, M: Clone + Send + 'static> TeamController<V, M> for FixedController<M> {
    fn fork(&self, partial_observability: bool) -> Self {
        self.forks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(partial_observability);
        self.clone()
    }
}

// ── RecordingController ─────────────────────────────────────────

/// Records every view it is handed, answers with a fixed move.
pub struct RecordingController<V, M> {
    mv: M,
    views: Arc<Mutex<Vec<V>>>,
}

impl<V, M> RecordingController<V, M> {
    pub fn new(mv: M) -> Self {
        Self {
            mv,
            views: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded views; survives the controller being
    /// moved onto a worker thread.
    pub fn views(&self) -> Arc<Mutex<Vec<V>>> {
        Arc::clone(&self.views)
    }
}

impl<V, M> Controller<V, M> for RecordingController<V, M>
where
    V: Send + 'static,
    M: Clone + Send + 'static,
{
    fn get_move(&mut self, view: V, _deadline: Deadline) -> M {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(view);
        self.mv.clone()
    }
}

impl<V, M> TeamController<V, M> for RecordingController<V, M>
where
    V: Send + 'static,
    M: Clone + Send + 'static,
{
    fn fork(&self, _partial_observability: bool) -> Self {
        Self {
            mv: self.mv.clone(),
            views: Arc::clone(&self.views),
        }
    }
}

// ── PanickingController ─────────────────────────────────────────

/// Panics on the `n`th call (1-based), answers normally otherwise.
pub struct PanickingController<M> {
    mv: M,
    panic_on: usize,
    calls: Arc<AtomicUsize>,
}

impl<M> PanickingController<M> {
    pub fn new(mv: M, panic_on: usize) -> Self {
        Self {
            mv,
            panic_on,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<V, M: Clone + Send + 'static> Controller<V, M> for PanickingController<M> {
    fn get_move(&mut self, _view: V, _deadline: Deadline) -> M {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.panic_on {
            panic!("controller failure on call {call}");
        }
        self.mv.clone()
    }
}

impl<V, M: Clone + Send + 'static> TeamController<V, M> for PanickingController<M> {
    fn fork(&self, _partial_observability: bool) -> Self {
        Self {
            mv: self.mv.clone(),
            panic_on: self.panic_on,
            calls: Arc::clone(&self.calls),
        }
    }
}

// ── KeyboardController ──────────────────────────────────────────

/// A human-style controller: exposes a keyboard sink and an overlay,
/// and answers with the last direction pressed.
pub struct KeyboardController {
    keys: Arc<KeyState>,
}

/// Key sink shared between the controller and the renderer.
#[derive(Default)]
pub struct KeyState {
    last: Mutex<Option<Key>>,
    presses: AtomicUsize,
}

impl KeyState {
    pub fn presses(&self) -> usize {
        self.presses.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<Key> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSink for KeyState {
    fn key_pressed(&self, key: Key) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(key);
        self.presses.fetch_add(1, Ordering::SeqCst);
    }

    fn key_released(&self, _key: Key) {}
}

struct PathOverlay;

impl<V> Drawable<V> for PathOverlay {
    fn draw(&self, _session: &V, layer: &mut OverlayLayer) {
        layer.push(OverlayPrimitive::Points {
            nodes: vec![0],
            color: Rgb(255, 255, 0),
        });
    }
}

impl KeyboardController {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(KeyState::default()),
        }
    }

    pub fn keys(&self) -> Arc<KeyState> {
        Arc::clone(&self.keys)
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Controller<V, crate::StubMove> for KeyboardController {
    fn get_move(&mut self, _view: V, _deadline: Deadline) -> crate::StubMove {
        match self.keys.last() {
            Some(Key::Left) | Some(Key::Down) => crate::StubMove(-1),
            Some(Key::Right) | Some(Key::Up) => crate::StubMove(1),
            _ => crate::StubMove(0),
        }
    }

    fn keyboard_input(&self) -> Option<Arc<dyn InputSink>> {
        Some(self.keys.clone())
    }

    fn overlay(&self) -> Option<Arc<dyn Drawable<V>>> {
        Some(Arc::new(PathOverlay))
    }
}

// ── ScriptedHandle ──────────────────────────────────────────────

/// Lifecycle and traffic counters shared between a [`ScriptedHandle`]
/// and the test that built it.
#[derive(Debug, Default)]
pub struct HandleCounters {
    pub starts: AtomicUsize,
    pub terminates: AtomicUsize,
    pub updates: AtomicUsize,
    pub move_reads: AtomicUsize,
}

impl HandleCounters {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn terminates(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn move_reads(&self) -> usize {
        self.move_reads.load(Ordering::SeqCst)
    }
}

/// An [`AsyncController`] driven entirely by a [`ManualClock`].
///
/// After each `update`, `has_computed` turns true once `ready_after` of
/// virtual time has passed (never, when `ready_after` is `None`).
pub struct ScriptedHandle<M> {
    side: Side,
    mv: M,
    ready_after: Option<Duration>,
    clock: Arc<ManualClock>,
    updated_at: Option<Instant>,
    fail_start: bool,
    panic_on_update: Option<usize>,
    counters: Arc<HandleCounters>,
}

impl<M: Clone> ScriptedHandle<M> {
    pub fn new(side: Side, mv: M, clock: Arc<ManualClock>) -> Self {
        Self {
            side,
            mv,
            ready_after: Some(Duration::ZERO),
            clock,
            updated_at: None,
            fail_start: false,
            panic_on_update: None,
            counters: Arc::new(HandleCounters::default()),
        }
    }

    /// Readiness delay after each update; `None` never becomes ready.
    pub fn ready_after(mut self, delay: Option<Duration>) -> Self {
        self.ready_after = delay;
        self
    }

    /// Make `start()` fail with [`ControllerError::SpawnFailed`].
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Panic inside the `n`th `update` (1-based).
    pub fn panicking_on_update(mut self, n: usize) -> Self {
        self.panic_on_update = Some(n);
        self
    }

    pub fn counters(&self) -> Arc<HandleCounters> {
        Arc::clone(&self.counters)
    }
}

impl<M> HandleLifecycle for ScriptedHandle<M> {
    fn start(&mut self) -> Result<(), ControllerError> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(ControllerError::SpawnFailed {
                side: self.side,
                reason: "scripted failure".into(),
            });
        }
        Ok(())
    }

    fn terminate(&mut self) {
        self.counters.terminates.fetch_add(1, Ordering::SeqCst);
    }
}

impl<V, M: Clone> AsyncController<V, M> for ScriptedHandle<M> {
    fn update(&mut self, _view: V, _deadline: Deadline) {
        let n = self.counters.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on_update == Some(n) {
            panic!("scripted handle failure on update {n}");
        }
        self.updated_at = Some(self.clock.now());
    }

    fn get_move(&self) -> M {
        self.counters.move_reads.fetch_add(1, Ordering::SeqCst);
        self.mv.clone()
    }

    fn has_computed(&self) -> bool {
        match (self.updated_at, self.ready_after) {
            (Some(at), Some(delay)) => self.clock.now().duration_since(at) >= delay,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::SystemClock;

    #[test]
    fn fixed_controller_records_fork_flags() {
        let base = FixedController::new(3u8);
        let forked = <FixedController<u8> as TeamController<(), u8>>::fork(&base, true);
        let _ = <FixedController<u8> as TeamController<(), u8>>::fork(&base, false);
        assert_eq!(base.fork_flags(), vec![true, false]);
        let mut forked = forked;
        let deadline = Deadline::after(&SystemClock, Duration::from_millis(1));
        assert_eq!(Controller::<(), u8>::get_move(&mut forked, (), deadline), 3);
        assert_eq!(base.calls(), 1);
    }

    #[test]
    fn scripted_handle_becomes_ready_after_delay() {
        let clock = Arc::new(ManualClock::new());
        let mut handle = ScriptedHandle::new(Side::Entity, 1u8, Arc::clone(&clock))
            .ready_after(Some(Duration::from_millis(3)));
        let deadline = Deadline::after(clock.as_ref(), Duration::from_millis(40));
        assert!(!AsyncController::<(), u8>::has_computed(&handle));
        AsyncController::<(), u8>::update(&mut handle, (), deadline);
        assert!(!AsyncController::<(), u8>::has_computed(&handle));
        clock.sleep(Duration::from_millis(3));
        assert!(AsyncController::<(), u8>::has_computed(&handle));
    }

    #[test]
    fn failing_start_reports_spawn_failure() {
        let clock = Arc::new(ManualClock::new());
        let mut handle = ScriptedHandle::new(Side::Group, 0u8, clock).failing_start();
        let err = handle.start().unwrap_err();
        assert!(matches!(err, ControllerError::SpawnFailed { side: Side::Group, .. }));
        assert_eq!(handle.counters().starts(), 1);
    }
}
