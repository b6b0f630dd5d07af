//! The simulation session capability consumed by the harness.
//!
//! The harness never implements game rules. It drives any type that
//! implements [`Session`]: creating one per run through a
//! [`SessionFactory`], handing *copies* of it to decision agents, and
//! advancing the single authoritative instance with the moves they return.

use crate::error::SessionError;
use crate::id::Side;
use crate::observability::ObservabilityPolicy;

/// Communication medium shared among members of the opposing group.
///
/// Message content is opaque to the harness. The only thing it relies on
/// is [`fork`](Messenger::fork): an independent snapshot that shares no
/// live state with the original, so agent threads can never mutate a
/// channel the stepper also touches.
///
/// [`Default`] is the channel an executor attaches when messaging is on and
/// no custom messenger was configured.
pub trait Messenger: Default + Send + 'static {
    /// Produce an independent copy of this channel.
    fn fork(&self) -> Self;
}

/// Placeholder messenger for sessions without group messaging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoMessenger;

impl Messenger for NoMessenger {
    fn fork(&self) -> Self {
        NoMessenger
    }
}

/// Authoritative, mutable simulation state for one run.
///
/// # Copy contract
///
/// [`Clone`] is the *full* copy: an unrestricted projection. Both `clone`
/// and [`restricted_copy`](Session::restricted_copy) must produce values
/// that share no mutable state with `self`; in particular any attached
/// [`Messenger`] must be [`fork`](Messenger::fork)ed, never aliased.
pub trait Session: Clone + Send + 'static {
    /// Move type chosen by the controlled entity.
    type EntityMove: Clone + Default + Send + 'static;
    /// Move type chosen by the opposing group (typically one move per member).
    type GroupMove: Clone + Default + Send + 'static;
    /// Messenger attached to the opposing group.
    type Messenger: Messenger;

    /// A copy restricted to what `viewer` may observe under the session's
    /// [`ObservabilityPolicy`].
    fn restricted_copy(&self, viewer: Side) -> Self;

    /// Advance the simulation by one tick using both sides' moves.
    fn advance(&mut self, entity: Self::EntityMove, group: Self::GroupMove);

    /// Whether the match has reached a terminal state.
    fn is_game_over(&self) -> bool;

    /// Current score of the controlled entity.
    fn score(&self) -> i64;

    /// Ticks advanced since the session was created.
    fn total_time(&self) -> u64;

    /// Serialize the full state as a single line of text.
    fn serialize_state(&self) -> String;

    /// Replace the state with a previously serialized one.
    fn load_state(&mut self, state: &str) -> Result<(), SessionError>;
}

/// Constructs fresh sessions for the harness.
///
/// Implemented for any `Fn(u64, &ObservabilityPolicy, Option<Messenger>) -> S`.
pub trait SessionFactory<S: Session>: Send + Sync {
    /// Create a session from a seed, the observability policy, and an
    /// optional (already forked) messenger.
    fn new_session(
        &self,
        seed: u64,
        policy: &ObservabilityPolicy,
        messenger: Option<S::Messenger>,
    ) -> S;
}

impl<S, F> SessionFactory<S> for F
where
    S: Session,
    F: Fn(u64, &ObservabilityPolicy, Option<S::Messenger>) -> S + Send + Sync,
{
    fn new_session(
        &self,
        seed: u64,
        policy: &ObservabilityPolicy,
        messenger: Option<S::Messenger>,
    ) -> S {
        self(seed, policy, messenger)
    }
}
