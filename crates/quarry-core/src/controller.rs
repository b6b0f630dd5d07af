//! Decision-agent capabilities.
//!
//! A [`Controller`] is the synchronous capability: given a view and a
//! deadline, return a move. An [`AsyncController`] is the submit/poll/collect
//! capability used by the threaded loops; the engine's threaded handle adapts
//! any `Controller` into one. Start and terminate live on the separate
//! [`HandleLifecycle`] trait so lifecycle guards need not name the view and
//! move types.

use std::sync::Arc;

use crate::error::ControllerError;
use crate::render::{Drawable, InputSink};
use crate::time::Deadline;

/// Synchronous decision agent: `V` is the view it receives, `M` the move it returns.
pub trait Controller<V, M>: Send + 'static {
    /// Compute a move for `view`, ideally before `deadline`.
    fn get_move(&mut self, view: V, deadline: Deadline) -> M;

    /// Input sink, if this controller is human-operated.
    fn keyboard_input(&self) -> Option<Arc<dyn InputSink>> {
        None
    }

    /// Overlay, if this controller can draw on the game view.
    fn overlay(&self) -> Option<Arc<dyn Drawable<V>>> {
        None
    }
}

impl<V, M, C> Controller<V, M> for Box<C>
where
    C: Controller<V, M> + ?Sized,
{
    fn get_move(&mut self, view: V, deadline: Deadline) -> M {
        (**self).get_move(view, deadline)
    }

    fn keyboard_input(&self) -> Option<Arc<dyn InputSink>> {
        (**self).keyboard_input()
    }

    fn overlay(&self) -> Option<Arc<dyn Drawable<V>>> {
        (**self).overlay()
    }
}

/// Controller for the opposing group that can be copied per run.
///
/// The copy is where the group's own partial-observability mode is fixed,
/// so each member can restrict itself further than the harness does.
pub trait TeamController<V, M>: Controller<V, M> + Sized {
    /// An independent copy configured for partial (`true`) or full observability.
    fn fork(&self, partial_observability: bool) -> Self;
}

/// Start/terminate half of an asynchronous handle.
pub trait HandleLifecycle {
    /// Begin background computation. Called at most once.
    fn start(&mut self) -> Result<(), ControllerError>;

    /// Stop background computation and release its resources. Must be
    /// idempotent; the engine calls it exactly once per run.
    fn terminate(&mut self);
}

/// Submit/poll/collect decision agent used by the threaded loops.
pub trait AsyncController<V, M>: HandleLifecycle {
    /// Submit a new view without blocking.
    fn update(&mut self, view: V, deadline: Deadline);

    /// The latest completed move (never a partially computed one).
    fn get_move(&self) -> M;

    /// Whether the most recently submitted view has been answered.
    fn has_computed(&self) -> bool;

    /// Input sink, if the wrapped controller is human-operated.
    fn keyboard_input(&self) -> Option<Arc<dyn InputSink>> {
        None
    }

    /// Overlay, if the wrapped controller can draw on the game view.
    fn overlay(&self) -> Option<Arc<dyn Drawable<V>>> {
        None
    }
}
