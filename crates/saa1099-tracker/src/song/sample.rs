//! Samples: per-tick volume, noise and frequency-shift envelopes.

use serde::{Deserialize, Serialize};

use super::compact::{format_sample_tick, parse_sample_tick};
use super::TICKS;
use crate::error::{Result, TrackerError};

/// Independent 4-bit left/right levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereoVolume {
    /// Left level (0-15)
    pub left: u8,
    /// Right level (0-15)
    pub right: u8,
}

impl StereoVolume {
    /// Build from two levels, masked to 4 bits.
    pub const fn new(left: u8, right: u8) -> Self {
        Self {
            left: left & 0x0F,
            right: right & 0x0F,
        }
    }

    /// Split a trackline volume byte (high nibble left, low nibble right).
    pub const fn from_byte(value: u8) -> Self {
        Self::new(value >> 4, value & 0x0F)
    }

    /// Chip amplitude register layout (low nibble left, high nibble right).
    pub const fn amplitude(self) -> u8 {
        (self.right << 4) | self.left
    }

    /// Exchange left and right.
    pub const fn swapped(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }

    /// Both sides at zero.
    pub const fn is_silent(self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// One tick of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTick {
    /// Output level per side
    pub volume: StereoVolume,
    /// Tone generator enabled
    pub enable_freq: bool,
    /// Noise enabled
    pub enable_noise: bool,
    /// Noise rate select (0-3, 3 = synced to the triplet's oscillator)
    pub noise: u8,
    /// Signed fine frequency shift (−1023..=1023)
    pub shift: i16,
}

impl SampleTick {
    /// Build a tick; `noise` is the rate (0-3) when noise is on.
    pub fn new(volume: StereoVolume, enable_freq: bool, noise: Option<u8>, shift: i16) -> Self {
        Self {
            volume,
            enable_freq,
            enable_noise: noise.is_some(),
            noise: noise.map_or(0, |rate| rate & 0x03),
            shift,
        }
    }

    /// Copy with the noise rate cleared while noise is off.
    pub fn normalized(self) -> Self {
        Self::new(
            self.volume,
            self.enable_freq,
            self.enable_noise.then_some(self.noise),
            self.shift,
        )
    }

    /// Whether the tick carries no data at all.
    pub fn is_empty(&self) -> bool {
        self.normalized() == Self::default()
    }
}

/// A 256-tick amplitude/noise/frequency envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Display name
    pub name: String,
    /// Tick data, always [`TICKS`] long
    pub data: Vec<SampleTick>,
    /// Active length (exclusive)
    pub end: usize,
    /// Repeat point; no loop when `loop_start >= end`
    pub loop_start: usize,
    /// Continue past `end` through the trailing ticks once released
    pub releasable: bool,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: String::new(),
            data: vec![SampleTick::default(); TICKS],
            end: 0,
            loop_start: 0,
            releasable: false,
        }
    }
}

impl Sample {
    /// The reserved silent sample: no tick data at all.
    pub(crate) const fn silent() -> Self {
        Self {
            name: String::new(),
            data: Vec::new(),
            end: 0,
            loop_start: 0,
            releasable: false,
        }
    }

    /// Parse compact `LRtN±SSS` rows; `end` becomes the row count and the
    /// sample does not loop.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() > TICKS {
            return Err(TrackerError::InvalidLength(rows.len()));
        }
        let mut sample = Sample::default();
        for (row, text) in rows.iter().enumerate() {
            sample.data[row] = parse_sample_tick(row, text.as_ref())?;
        }
        sample.end = rows.len();
        sample.loop_start = rows.len();
        Ok(sample)
    }

    /// Export compact rows up to the last non-empty tick.
    pub fn export(&self) -> Vec<String> {
        let used = self.data.iter().rposition(|t| !t.is_empty()).map_or(0, |i| i + 1);
        self.data[..used].iter().map(format_sample_tick).collect()
    }

    /// Set the loop point (builder style).
    pub fn with_loop(mut self, loop_start: usize) -> Self {
        self.loop_start = loop_start;
        self
    }

    /// Mark as releasable (builder style).
    pub fn with_release(mut self, releasable: bool) -> Self {
        self.releasable = releasable;
        self
    }

    /// Whether playback wraps to `loop_start` at `end`.
    pub fn loops(&self) -> bool {
        self.loop_start < self.end
    }

    /// Index past the last non-empty tick, never shorter than `end`.
    pub fn tail_len(&self) -> usize {
        let used = self.data.iter().rposition(|t| !t.is_empty()).map_or(0, |i| i + 1);
        used.max(self.end).min(TICKS)
    }

    /// Whether the sample has no active ticks.
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Tick at `index`, empty past the table.
    pub fn tick(&self, index: usize) -> SampleTick {
        self.data
            .get(index)
            .map_or_else(SampleTick::default, |tick| tick.normalized())
    }
}
