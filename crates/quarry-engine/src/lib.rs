//! Time-bounded execution engine for Quarry matches.
//!
//! The [`Executor`] drives an entity controller against a group controller
//! over a [`Session`](quarry_core::Session) it alone owns and mutates.
//! Controllers only ever see projections: full clones or restricted
//! copies, chosen per side by the [`ExecutorConfig`].
//!
//! # Execution modes
//!
//! | Mode | Entry point | Threads |
//! |---|---|---|
//! | Blocking | [`run_game`](Executor::run_game), [`run_experiment`](Executor::run_experiment) | stepper only |
//! | Trial batch | [`run_experiment_ticks`](Executor::run_experiment_ticks) | stepper only |
//! | Fixed delay | [`run_game_timed`](Executor::run_game_timed) | stepper + one per side |
//! | Speed optimised | [`run_game_timed_speed_optimised`](Executor::run_game_timed_speed_optimised) | stepper + one per side |
//! | Recorded | [`run_game_timed_recorded`](Executor::run_game_timed_recorded) | stepper + one per side |
//! | Replay | [`replay_game`](Executor::replay_game) | stepper only |
//!
//! Threaded modes take any [`AsyncController`](quarry_core::AsyncController);
//! [`ControllerHandle`] adapts a synchronous controller by running it on a
//! named worker thread. Each handle is started once and terminated exactly
//! once per run through a [`TerminateGuard`].
//!
//! Every sleep and deadline goes through the configured
//! [`Clock`](quarry_core::Clock), so the timing behaviour is testable with a
//! virtual clock.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod blocking;
pub mod config;
pub mod executor;
pub mod guard;
pub mod handle;
pub mod player;
pub mod recorder;
pub mod speed;
pub mod stats;
pub mod timed;

pub use batch::BatchReport;
pub use config::{ConfigError, ExecutorConfig, ExecutorConfigBuilder, PeekHook, PollingConfig};
pub use executor::{Executor, RunOutcome, StopReason};
pub use guard::TerminateGuard;
pub use handle::{ControllerHandle, TerminationReport};
pub use player::ReplaySummary;
pub use recorder::RecordedRun;
pub use speed::{poll_until_ready, PollOutcome};
pub use stats::{write_stats, Stats};
