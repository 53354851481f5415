//! Patterns: single-channel lists of tracklines.

use serde::{Deserialize, Serialize};

use super::compact::{format_trackline, parse_trackline};
use super::MAX_PATTERN_LINES;
use crate::error::{Result, TrackerError};

/// One row of a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trackline {
    /// Tone 1..=96, 0 = no change
    pub tone: u8,
    /// Release the playing sample
    pub release: bool,
    /// Sample index, 0 = no change
    pub smp: u8,
    /// Ornament index, 0 = no change
    pub orn: u8,
    /// Release the playing ornament
    pub orn_release: bool,
    /// Volume (high nibble left, low nibble right), 0 = no change
    pub volume: u8,
    /// Effect id 0x1-0xF, 0 = none
    pub cmd: u8,
    /// Effect parameter
    pub param: u8,
}

impl Trackline {
    /// Whether the line carries no data at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Up to [`MAX_PATTERN_LINES`] tracklines for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Line data, always [`MAX_PATTERN_LINES`] long
    pub lines: Vec<Trackline>,
    /// Used length
    pub end: usize,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            lines: vec![Trackline::default(); MAX_PATTERN_LINES],
            end: 0,
        }
    }
}

impl Pattern {
    pub(crate) const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            end: 0,
        }
    }

    /// Parse compact `TTrSOoVVCPP` rows; `end` becomes the row count.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() > MAX_PATTERN_LINES {
            return Err(TrackerError::InvalidLength(rows.len()));
        }
        let mut pattern = Pattern::default();
        for (row, text) in rows.iter().enumerate() {
            pattern.lines[row] = parse_trackline(row, text.as_ref())?;
        }
        pattern.end = rows.len();
        Ok(pattern)
    }

    /// Export rows up to the last non-empty line.
    pub fn export(&self) -> Vec<String> {
        let used = self.lines.iter().rposition(|l| !l.is_empty()).map_or(0, |i| i + 1);
        self.lines[..used].iter().map(format_trackline).collect()
    }

    /// Line at `index`, empty past the table.
    pub fn line(&self, index: usize) -> Trackline {
        self.lines.get(index).copied().unwrap_or_default()
    }

    /// Mutable line access; `None` past the table.
    pub fn line_mut(&mut self, index: usize) -> Option<&mut Trackline> {
        self.lines.get_mut(index)
    }
}
