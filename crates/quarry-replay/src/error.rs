//! Error types for the replay system.

use std::io;

use thiserror::Error;

/// Errors that can occur while persisting or loading a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An I/O error occurred during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A record contains a line break and would split into several lines.
    #[error("record {index} contains a line break")]
    MultilineRecord {
        /// Zero-based position of the offending record.
        index: usize,
    },
    /// A record is empty or whitespace only and would be dropped on load.
    #[error("record {index} is blank")]
    BlankRecord {
        /// Zero-based position of the offending record.
        index: usize,
    },
}
