//! Error types for song editing and player construction.
//!
//! Playback itself never fails: malformed effects are inert and bad object
//! indices fall back to the reserved entry 0.

use saa1099::Saa1099Error;
use thiserror::Error;

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur when building songs or players.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A compact text row could not be parsed.
    #[error("Invalid {kind} row {row}: {message}")]
    Parse {
        /// Container kind ("sample", "ornament", "pattern").
        kind: &'static str,
        /// Zero-based row index.
        row: usize,
        /// What was wrong.
        message: String,
    },

    /// Speed byte that resolves to no valid tick count.
    #[error("Invalid speed byte 0x{0:02X}")]
    InvalidSpeed(u8),

    /// Container length out of range.
    #[error("Invalid length {0}")]
    InvalidLength(usize),

    /// Object index beyond its table.
    #[error("{what} {index} out of range (0..{available})")]
    IndexOutOfRange {
        /// Table name.
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Table size.
        available: usize,
    },

    /// Player configuration rejected.
    #[error("Invalid player configuration: {0}")]
    Config(String),

    /// Chip emulator error.
    #[error("Chip error: {0}")]
    Chip(#[from] Saa1099Error),
}

impl TrackerError {
    pub(crate) fn parse(kind: &'static str, row: usize, message: impl Into<String>) -> Self {
        TrackerError::Parse {
            kind,
            row,
            message: message.into(),
        }
    }
}
