//! The executor: session setup, observability projection, and the helpers
//! every execution loop shares.

use std::fmt;
use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use quarry_core::{
    Controller, Deadline, Drawable, InputSink, Messenger, Renderer, Session, SessionFactory, Side,
    TeamController,
};

use crate::config::ExecutorConfig;
use crate::handle::ControllerHandle;

// ── Outcomes ──────────────────────────────────────────────────────

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The session reported game over.
    GameOver,
    /// The configured tick ceiling was reached.
    TickLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver => f.write_str("game over"),
            Self::TickLimit => f.write_str("tick limit"),
        }
    }
}

/// Final state of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Score when the run stopped.
    pub score: i64,
    /// Ticks advanced (the session's total time).
    pub ticks: u64,
    /// Which terminal condition fired.
    pub reason: StopReason,
}

impl RunOutcome {
    pub(crate) fn of<S: Session>(session: &S, reason: StopReason) -> Self {
        Self {
            score: session.score(),
            ticks: session.total_time(),
            reason,
        }
    }
}

// ── Executor ──────────────────────────────────────────────────────

/// Drives matches between an entity controller and a group controller.
///
/// Owns the immutable [`ExecutorConfig`], the session factory, and the
/// seeded generator that hands every run a fresh session seed. The loops
/// themselves live in sibling modules as further `impl` blocks.
pub struct Executor<S: Session> {
    pub(crate) config: ExecutorConfig<S>,
    factory: Arc<dyn SessionFactory<S>>,
    rng: ChaCha8Rng,
}

impl<S: Session> Executor<S> {
    /// Create an executor. Session seeds are drawn from a `ChaCha8Rng`
    /// seeded with the configured seed, or from entropy.
    pub fn new(config: ExecutorConfig<S>, factory: impl SessionFactory<S> + 'static) -> Self {
        let rng = match config.seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            factory: Arc::new(factory),
            rng,
        }
    }

    /// The configuration this executor runs with.
    pub fn config(&self) -> &ExecutorConfig<S> {
        &self.config
    }

    /// Construct a fresh authoritative session with the next seed and,
    /// when messaging is on, a fork of the configured messenger.
    pub fn setup_session(&mut self) -> S {
        self.draw_session().1
    }

    /// Like [`Executor::setup_session`], also returning the seed drawn for it.
    pub(crate) fn draw_session(&mut self) -> (u64, S) {
        let seed = self.rng.next_u64();
        (seed, self.new_session(seed))
    }

    pub(crate) fn new_session(&self, seed: u64) -> S {
        let messenger = self.config.messenger().map(Messenger::fork);
        debug!(seed, messaging = messenger.is_some(), "session created");
        self.factory
            .new_session(seed, &self.config.policy(), messenger)
    }

    /// The view `side` is allowed to see this tick.
    ///
    /// A full clone when that side's partial-observability flag is off,
    /// otherwise the session's restricted copy for `side`. Either way the
    /// result shares nothing with `session`.
    pub fn project(&self, session: &S, side: Side) -> S {
        let restricted = match side {
            Side::Entity => self.config.entity_partial_observability(),
            Side::Group => self.config.group_partial_observability(),
        };
        if restricted {
            session.restricted_copy(side)
        } else {
            session.clone()
        }
    }

    /// Fork the group's team controller for one run, in the configured
    /// partial-observability mode.
    pub fn fork_group<T>(&self, team: &T) -> T
    where
        T: TeamController<S, S::GroupMove>,
    {
        team.fork(self.config.group_partial_observability())
    }

    /// Wrap a synchronous entity controller in a threaded handle.
    pub fn entity_handle<C>(&self, controller: C) -> ControllerHandle<S, S::EntityMove>
    where
        C: Controller<S, S::EntityMove>,
    {
        ControllerHandle::new(Side::Entity, controller, self.config.join_budget())
    }

    /// Fork `team` and wrap the fork in a threaded handle.
    pub fn group_handle<T>(&self, team: &T) -> ControllerHandle<S, S::GroupMove>
    where
        T: TeamController<S, S::GroupMove>,
    {
        ControllerHandle::new(Side::Group, self.fork_group(team), self.config.join_budget())
    }

    /// Deadline for a decision requested now.
    pub(crate) fn deadline(&self) -> Deadline {
        Deadline::after(self.config.clock().as_ref(), self.config.time_budget())
    }

    /// Terminal condition for `session`, if any. Checked before every tick
    /// so no run advances past the tick ceiling.
    pub(crate) fn stop_reason(&self, session: &S) -> Option<StopReason> {
        if session.is_game_over() {
            return Some(StopReason::GameOver);
        }
        match self.config.tick_limit() {
            Some(limit) if session.total_time() >= limit => Some(StopReason::TickLimit),
            _ => None,
        }
    }

    pub(crate) fn handle_peek(&self, session: &S) {
        if let Some(peek) = self.config.peek() {
            let line = peek(session);
            info!(target: "quarry::peek", tick = session.total_time(), "{line}");
        }
    }

    /// Open a renderer when visuals are on, wiring the entity's optional
    /// keyboard sink and overlay.
    pub(crate) fn open_view(
        &self,
        session: &S,
        keyboard: Option<Arc<dyn InputSink>>,
        overlay: Option<Arc<dyn Drawable<S>>>,
    ) -> Option<Box<dyn Renderer<S>>> {
        if !self.config.visuals() {
            return None;
        }
        self.open_renderer(session, keyboard, overlay)
    }

    pub(crate) fn open_renderer(
        &self,
        session: &S,
        keyboard: Option<Arc<dyn InputSink>>,
        overlay: Option<Arc<dyn Drawable<S>>>,
    ) -> Option<Box<dyn Renderer<S>>> {
        let factory = self.config.renderer()?;
        let mut view = factory.create();
        let human = keyboard.is_some();
        if let Some(input) = keyboard {
            view.attach_input(input);
        }
        if let Some(drawable) = overlay {
            view.add_drawable(drawable);
        }
        view.show(session, &self.config.render_settings(human));
        Some(view)
    }
}

impl<S: Session> fmt::Debug for Executor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
