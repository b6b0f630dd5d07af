//! Test utilities and stub types for Quarry development.
//!
//! Provides a stub [`Session`](quarry_core::Session) with known visible and
//! hidden entities, scripted controllers and asynchronous handles, a
//! recording renderer, and a virtual [`ManualClock`] so timing behaviour
//! can be asserted exactly.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod clock;
pub mod controllers;
pub mod render;
pub mod session;

pub use clock::ManualClock;
pub use controllers::{
    FixedController, HandleCounters, KeyState, KeyboardController, PanickingController,
    RecordingController, ScriptedHandle,
};
pub use render::{RecordingRenderer, RenderLog};
pub use session::{StubMessenger, StubMove, StubSession};
