//! Replay traces for Quarry matches.
//!
//! A replay is the ordered list of serialized session states, one per
//! advanced tick. The on-disk form is newline-delimited text: each line is
//! one state in the session's own serialization format, opaque here.
//!
//! # Architecture
//!
//! - [`ReplayTrace`] is the in-memory, ordered record sequence
//! - [`ReplayWriter`] streams records to any `Write` sink
//! - [`ReplayReader`] yields records from any `BufRead` source, skipping
//!   blank and non-UTF-8 lines
//! - [`save_trace`] / [`load_trace`] persist to a file path, overwriting by
//!   default or appending with [`WriteMode::Append`]
//!
//! # Format
//!
//! ```text
//! <state after tick 1>\n
//! <state after tick 2>\n
//! ...
//! <state after tick N>\n
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod reader;
pub mod trace;
pub mod writer;

pub use error::ReplayError;
pub use reader::{load_trace, ReplayReader};
pub use trace::ReplayTrace;
pub use writer::{save_trace, ReplayWriter, WriteMode};
