//! Core types and traits for the Quarry match harness.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! capabilities the execution engine consumes without implementing: the
//! simulation [`Session`], the opposing group's [`Messenger`], decision
//! agents ([`Controller`], [`AsyncController`]), the observability policy,
//! and the wall-clock abstraction ([`Clock`], [`Deadline`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod id;
pub mod observability;
pub mod render;
pub mod session;
pub mod time;

pub use controller::{AsyncController, Controller, HandleLifecycle, TeamController};
pub use error::{ControllerError, SessionError};
pub use id::Side;
pub use observability::{ObservabilityPolicy, PolicyKind, UnknownPolicy};
pub use render::{
    Drawable, InputSink, Key, OverlayLayer, OverlayPrimitive, RenderSettings, Renderer,
    RendererFactory, Rgb,
};
pub use session::{Messenger, NoMessenger, Session, SessionFactory};
pub use time::{Clock, Deadline, SystemClock};
