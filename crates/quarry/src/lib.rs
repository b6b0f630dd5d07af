//! Quarry: a time-bounded harness for two-sided pursuit simulations.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Quarry sub-crates. For most users, adding `quarry` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use quarry::prelude::*;
//!
//! // A session that only counts ticks and ends after three.
//! #[derive(Clone)]
//! struct Countdown { tick: u64 }
//!
//! impl Session for Countdown {
//!     type EntityMove = u8;
//!     type GroupMove = u8;
//!     type Messenger = NoMessenger;
//!     fn restricted_copy(&self, _viewer: Side) -> Self { self.clone() }
//!     fn advance(&mut self, _entity: u8, _group: u8) { self.tick += 1; }
//!     fn is_game_over(&self) -> bool { self.tick >= 3 }
//!     fn score(&self) -> i64 { self.tick as i64 * 10 }
//!     fn total_time(&self) -> u64 { self.tick }
//!     fn serialize_state(&self) -> String { self.tick.to_string() }
//!     fn load_state(&mut self, state: &str) -> Result<(), SessionError> {
//!         self.tick = state.parse().map_err(|_| SessionError::MalformedState {
//!             detail: state.to_string(),
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Idle;
//! impl Controller<Countdown, u8> for Idle {
//!     fn get_move(&mut self, _view: Countdown, _deadline: Deadline) -> u8 { 0 }
//! }
//! impl TeamController<Countdown, u8> for Idle {
//!     fn fork(&self, _partial_observability: bool) -> Self { Idle }
//! }
//!
//! let config = ExecutorConfig::<Countdown>::builder().seed(42).build().unwrap();
//! let mut exec = Executor::new(
//!     config,
//!     |_seed: u64, _policy: &ObservabilityPolicy, _messenger: Option<NoMessenger>| {
//!         Countdown { tick: 0 }
//!     },
//! );
//! let outcome = exec.run_game(&mut Idle, &Idle, Duration::ZERO);
//! assert_eq!(outcome.ticks, 3);
//! assert_eq!(outcome.score, 30);
//! assert_eq!(outcome.reason, StopReason::GameOver);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `quarry-core` | Session, controller, render and clock capabilities |
//! | [`engine`] | `quarry-engine` | Executor, execution loops, handles, statistics |
//! | [`replay`] | `quarry-replay` | Replay traces and their file format |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Capabilities the harness consumes (`quarry-core`).
///
/// Contains the [`types::Session`] and [`types::Controller`] traits, the
/// observability policy, the render contract, and the [`types::Clock`]
/// abstraction.
pub use quarry_core as types;

/// Execution engine (`quarry-engine`).
///
/// [`engine::Executor`] runs blocking, threaded, speed-optimised, recorded
/// and replayed matches; [`engine::ControllerHandle`] moves a synchronous
/// controller onto its own thread.
pub use quarry_engine as engine;

/// Replay traces (`quarry-replay`).
///
/// Persist runs with [`replay::save_trace`] and load them back with
/// [`replay::load_trace`].
pub use quarry_replay as replay;

/// Common imports for typical Quarry usage.
///
/// ```rust
/// use quarry::prelude::*;
/// ```
pub mod prelude {
    // Session and controllers
    pub use quarry_core::{
        AsyncController, Controller, HandleLifecycle, Messenger, NoMessenger, Session,
        SessionFactory, Side, TeamController,
    };

    // Observability and time
    pub use quarry_core::{Clock, Deadline, ObservabilityPolicy, PolicyKind, SystemClock};

    // Errors
    pub use quarry_core::{ControllerError, SessionError};
    pub use quarry_engine::ConfigError;
    pub use quarry_replay::ReplayError;

    // Engine
    pub use quarry_engine::{
        BatchReport, ControllerHandle, Executor, ExecutorConfig, PollingConfig, RunOutcome,
        Stats, StopReason,
    };

    // Replay
    pub use quarry_replay::{ReplayTrace, WriteMode};
}
