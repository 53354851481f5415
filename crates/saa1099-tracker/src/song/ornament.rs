//! Ornaments: per-tick semitone offsets layered onto a playing tone.

use serde::{Deserialize, Serialize};

use super::compact::{format_ornament_tick, parse_ornament_tick};
use super::TICKS;
use crate::error::{Result, TrackerError};

/// A 256-tick semitone offset sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ornament {
    /// Display name
    pub name: String,
    /// Semitone offsets, always [`TICKS`] long
    pub data: Vec<i8>,
    /// Active length (exclusive)
    pub end: usize,
    /// Repeat point; no loop when `loop_start >= end`
    pub loop_start: usize,
}

impl Default for Ornament {
    fn default() -> Self {
        Self {
            name: String::new(),
            data: vec![0; TICKS],
            end: 0,
            loop_start: 0,
        }
    }
}

impl Ornament {
    pub(crate) const fn empty() -> Self {
        Self {
            name: String::new(),
            data: Vec::new(),
            end: 0,
            loop_start: 0,
        }
    }

    /// Parse signed decimal rows; `end` becomes the row count, looping from 0.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() > TICKS {
            return Err(TrackerError::InvalidLength(rows.len()));
        }
        let mut ornament = Ornament::default();
        for (row, text) in rows.iter().enumerate() {
            ornament.data[row] = parse_ornament_tick(row, text.as_ref())?;
        }
        ornament.end = rows.len();
        Ok(ornament)
    }

    /// Export rows up to the last non-zero offset.
    pub fn export(&self) -> Vec<String> {
        let used = self.data.iter().rposition(|&o| o != 0).map_or(0, |i| i + 1);
        self.data[..used]
            .iter()
            .map(|&o| format_ornament_tick(o))
            .collect()
    }

    /// Set the loop point (builder style).
    pub fn with_loop(mut self, loop_start: usize) -> Self {
        self.loop_start = loop_start;
        self
    }

    /// Whether playback wraps to `loop_start` at `end`.
    pub fn loops(&self) -> bool {
        self.loop_start < self.end
    }

    /// Whether the ornament has no active ticks.
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Offset at `index`, zero past the table.
    pub fn offset(&self, index: usize) -> i8 {
        self.data.get(index).copied().unwrap_or(0)
    }
}
