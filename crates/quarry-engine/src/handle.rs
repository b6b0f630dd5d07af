//! Threaded controller handle: runs a synchronous [`Controller`] on a
//! dedicated worker thread behind the [`AsyncController`] interface.
//!
//! # Architecture
//!
//! ```text
//! Stepper thread                         Worker thread (quarry-<side>)
//!     |                                        |
//!     |--update(view, deadline)--------------->| job_rx.recv()
//!     |   [job_tx: unbounded]                  | drain to newest job
//!     |   issued += 1                          | controller.get_move(view, deadline)
//!     |                                        | slot.latest = move
//!     |<--has_computed(): completed == issued--| slot.completed = generation
//!     |<--get_move(): slot.latest.clone()      |
//!     |                                        |
//!     |--terminate(): shutdown, drop job_tx--->| recv() -> Err, exit
//!     |   join within join_budget              |
//! ```
//!
//! The worker never sees the live session, only the projection handed to
//! `update`. A panic inside the controller forfeits that tick: it is
//! logged, the previous move stays in the slot, and the generation is
//! still marked complete so polling does not stall.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use quarry_core::{
    AsyncController, Controller, ControllerError, Deadline, Drawable, HandleLifecycle, InputSink,
    Side,
};

// ── MoveSlot ─────────────────────────────────────────────────────

/// Single-buffered result slot written by the worker, read by the stepper.
struct MoveSlot<M> {
    latest: Mutex<M>,
    /// Generation of the newest job submitted.
    issued: AtomicU64,
    /// Generation of the newest job answered (or forfeited).
    completed: AtomicU64,
}

impl<M: Default> MoveSlot<M> {
    fn new() -> Self {
        Self {
            latest: Mutex::new(M::default()),
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }
}

struct Job<V> {
    view: V,
    deadline: Deadline,
    generation: u64,
}

// ── TerminationReport ────────────────────────────────────────────

/// Report from [`ControllerHandle::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationReport {
    /// Time spent waiting for the worker.
    pub total_ms: u64,
    /// Whether the worker was joined. `false` means it overran the join
    /// budget and was detached.
    pub joined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Idle,
    Running,
    Terminated,
}

// ── ControllerHandle ─────────────────────────────────────────────

/// [`AsyncController`] backed by a worker thread running a synchronous
/// [`Controller`].
///
/// Not-ready policy: [`get_move`](AsyncController::get_move) returns the
/// most recently *completed* move, or `M::default()` before the first
/// completion. An in-flight computation is never observed.
pub struct ControllerHandle<V, M> {
    side: Side,
    controller: Option<Box<dyn Controller<V, M>>>,
    keyboard: Option<Arc<dyn InputSink>>,
    overlay: Option<Arc<dyn Drawable<V>>>,
    slot: Arc<MoveSlot<M>>,
    job_tx: Option<Sender<Job<V>>>,
    shutdown_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    state: HandleState,
    join_budget: Duration,
}

impl<V, M> ControllerHandle<V, M>
where
    V: Send + 'static,
    M: Clone + Default + Send + 'static,
{
    /// Wrap `controller`. Its optional capabilities are captured now,
    /// before it moves onto the worker thread.
    pub fn new(side: Side, controller: impl Controller<V, M>, join_budget: Duration) -> Self {
        let keyboard = controller.keyboard_input();
        let overlay = controller.overlay();
        Self {
            side,
            controller: Some(Box::new(controller)),
            keyboard,
            overlay,
            slot: Arc::new(MoveSlot::new()),
            job_tx: None,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            state: HandleState::Idle,
            join_budget,
        }
    }
}

impl<V, M> ControllerHandle<V, M> {
    /// Which side this handle plays.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Whether the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.state == HandleState::Running
    }

    /// Stop the worker: set the shutdown flag, close the job channel, and
    /// join within the join budget. Idempotent.
    pub fn shutdown(&mut self) -> TerminationReport {
        if self.state == HandleState::Terminated {
            return TerminationReport {
                total_ms: 0,
                joined: true,
            };
        }
        self.state = HandleState::Terminated;
        self.controller = None;

        let start = Instant::now();
        self.shutdown_flag.store(true, Ordering::Release);
        self.job_tx.take();

        let joined = match self.worker.take() {
            None => true,
            Some(worker) => {
                let deadline = start + self.join_budget;
                while !worker.is_finished() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                if worker.is_finished() {
                    if worker.join().is_err() {
                        warn!(side = %self.side, "controller worker exited by panic");
                    }
                    true
                } else {
                    warn!(
                        side = %self.side,
                        budget_ms = self.join_budget.as_millis() as u64,
                        "controller still computing at termination; detaching worker"
                    );
                    false
                }
            }
        };
        let total_ms = start.elapsed().as_millis() as u64;
        debug!(side = %self.side, joined, total_ms, "controller terminated");
        TerminationReport { total_ms, joined }
    }
}

impl<V, M> HandleLifecycle for ControllerHandle<V, M>
where
    V: Send + 'static,
    M: Clone + Default + Send + 'static,
{
    fn start(&mut self) -> Result<(), ControllerError> {
        match self.state {
            HandleState::Running => return Err(ControllerError::AlreadyStarted { side: self.side }),
            HandleState::Terminated => return Err(ControllerError::Terminated { side: self.side }),
            HandleState::Idle => {}
        }
        let Some(controller) = self.controller.take() else {
            return Err(ControllerError::Terminated { side: self.side });
        };

        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        let slot = Arc::clone(&self.slot);
        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let side = self.side;
        let worker = thread::Builder::new()
            .name(format!("quarry-{}", side.label()))
            .spawn(move || worker_loop(side, controller, job_rx, slot, shutdown_flag))
            .map_err(|e| {
                self.state = HandleState::Terminated;
                ControllerError::SpawnFailed {
                    side,
                    reason: e.to_string(),
                }
            })?;

        self.job_tx = Some(job_tx);
        self.worker = Some(worker);
        self.state = HandleState::Running;
        debug!(side = %self.side, "controller started");
        Ok(())
    }

    fn terminate(&mut self) {
        self.shutdown();
    }
}

impl<V, M> AsyncController<V, M> for ControllerHandle<V, M>
where
    V: Send + 'static,
    M: Clone + Default + Send + 'static,
{
    fn update(&mut self, view: V, deadline: Deadline) {
        let Some(job_tx) = self.job_tx.as_ref() else {
            debug!(side = %self.side, state = ?self.state, "update ignored; controller not running");
            return;
        };
        let generation = self.slot.issued.fetch_add(1, Ordering::AcqRel) + 1;
        if job_tx
            .send(Job {
                view,
                deadline,
                generation,
            })
            .is_err()
        {
            // Worker gone: nothing will answer this generation.
            self.slot.completed.store(generation, Ordering::Release);
        }
    }

    fn get_move(&self) -> M {
        self.slot
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn has_computed(&self) -> bool {
        let issued = self.slot.issued.load(Ordering::Acquire);
        issued > 0 && self.slot.completed.load(Ordering::Acquire) >= issued
    }

    fn keyboard_input(&self) -> Option<Arc<dyn InputSink>> {
        self.keyboard.clone()
    }

    fn overlay(&self) -> Option<Arc<dyn Drawable<V>>> {
        self.overlay.clone()
    }
}

impl<V, M> Drop for ControllerHandle<V, M> {
    fn drop(&mut self) {
        if self.state == HandleState::Running {
            self.shutdown();
        }
    }
}

// ── Worker ───────────────────────────────────────────────────────

fn worker_loop<V: 'static, M: 'static>(
    side: Side,
    mut controller: Box<dyn Controller<V, M>>,
    job_rx: Receiver<Job<V>>,
    slot: Arc<MoveSlot<M>>,
    shutdown_flag: Arc<AtomicBool>,
) {
    while let Ok(mut job) = job_rx.recv() {
        while let Ok(newer) = job_rx.try_recv() {
            job = newer;
        }
        if shutdown_flag.load(Ordering::Acquire) {
            break;
        }
        let Job {
            view,
            deadline,
            generation,
        } = job;
        match catch_unwind(AssertUnwindSafe(|| controller.get_move(view, deadline))) {
            Ok(mv) => {
                *slot.latest.lock().unwrap_or_else(PoisonError::into_inner) = mv;
            }
            Err(payload) => {
                error!(
                    side = %side,
                    generation,
                    panic = panic_message(payload.as_ref()),
                    "controller panicked; tick forfeited"
                );
            }
        }
        slot.completed.store(generation, Ordering::Release);
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
