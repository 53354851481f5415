//! Positions and line speeds.

use serde::{Deserialize, Serialize};

use super::{CHANNELS, MAX_PATTERN_LINES};
use crate::error::{Result, TrackerError};
use crate::runtime::Runtime;

/// Ticks per line, either constant or alternating between even and odd lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speed {
    /// Same tick count on every line
    Plain(u8),
    /// Swing: `even` ticks on even lines, `odd` ticks on odd lines
    Swing {
        /// Ticks on even lines
        even: u8,
        /// Ticks on odd lines
        odd: u8,
    },
}

impl Speed {
    /// Decode a speed byte.
    ///
    /// `0x01..=0x1F` is a plain speed. From `0x20` up the high nibble gives
    /// the even-line and the low nibble the odd-line speed; a zero low nibble
    /// is invalid and equal nibbles collapse to a plain speed.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => None,
            1..=0x1F => Some(Speed::Plain(value)),
            _ => {
                let (even, odd) = (value >> 4, value & 0x0F);
                if odd == 0 {
                    None
                } else if even == odd {
                    Some(Speed::Plain(even))
                } else {
                    Some(Speed::Swing { even, odd })
                }
            }
        }
    }

    /// Encode back into a speed byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Speed::Plain(n) => n,
            Speed::Swing { even, odd } => (even << 4) | (odd & 0x0F),
        }
    }

    /// Tick count of a line (never zero).
    #[inline]
    pub fn ticks_for_line(self, line: usize) -> u8 {
        let ticks = match self {
            Speed::Plain(n) => n,
            Speed::Swing { even, odd } => {
                if line % 2 == 0 {
                    even
                } else {
                    odd
                }
            }
        };
        ticks.max(1)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed::Plain(6)
    }
}

/// Pattern assignment and transpose of one channel within a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChannel {
    /// Pattern index (0 = the reserved empty pattern)
    pub pattern: usize,
    /// Semitone transpose
    pub pitch: i8,
}

/// One composition row: a pattern per channel, length and initial speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Per-channel pattern and transpose
    pub ch: [PositionChannel; CHANNELS],
    /// Number of lines (1..=128)
    pub length: usize,
    /// Speed at line 0
    pub speed: Speed,
    /// `frames[l]` = ticks elapsed before line `l` (`length + 1` entries)
    pub frames: Vec<u32>,
    /// Channel state on entry, filled lazily by the player
    #[serde(skip)]
    pub initial_state: Option<Box<Runtime>>,
}

impl Position {
    /// Create a position with every channel on the empty pattern.
    pub fn new(length: usize, speed: u8) -> Result<Self> {
        if length == 0 || length > MAX_PATTERN_LINES {
            return Err(TrackerError::InvalidLength(length));
        }
        let speed = Speed::from_byte(speed).ok_or(TrackerError::InvalidSpeed(speed))?;
        Ok(Self {
            ch: [PositionChannel::default(); CHANNELS],
            length,
            speed,
            frames: Vec::new(),
            initial_state: None,
        })
    }

    /// Assign a pattern and transpose to a channel (builder style).
    pub fn with_channel(mut self, channel: usize, pattern: usize, pitch: i8) -> Self {
        if let Some(ch) = self.ch.get_mut(channel) {
            *ch = PositionChannel { pattern, pitch };
        }
        self
    }

    /// Total ticks of the position, if counted.
    pub fn total_frames(&self) -> u32 {
        self.frames.last().copied().unwrap_or(0)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.ch == other.ch && self.length == other.length && self.speed == other.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_zero_is_invalid() {
        assert_eq!(Speed::from_byte(0), None);
        assert!(matches!(
            Position::new(4, 0),
            Err(TrackerError::InvalidSpeed(0))
        ));
    }

    #[test]
    fn test_swing_decoding() {
        assert_eq!(Speed::from_byte(0x06), Some(Speed::Plain(6)));
        assert_eq!(Speed::from_byte(0x1F), Some(Speed::Plain(0x1F)));
        assert_eq!(Speed::from_byte(0x55), Some(Speed::Plain(5)));
        assert_eq!(Speed::from_byte(0x50), None);
        assert_eq!(
            Speed::from_byte(0x64),
            Some(Speed::Swing { even: 6, odd: 4 })
        );
    }

    #[test]
    fn test_swing_alternates() {
        let speed = Speed::Swing { even: 6, odd: 4 };
        let ticks: Vec<u8> = (0..4).map(|l| speed.ticks_for_line(l)).collect();
        assert_eq!(ticks, vec![6, 4, 6, 4]);
        assert_eq!(speed.to_byte(), 0x64);
    }

    #[test]
    fn test_position_length_bounds() {
        assert!(Position::new(0, 6).is_err());
        assert!(Position::new(129, 6).is_err());
        let pos = Position::new(128, 6).unwrap().with_channel(2, 3, -12);
        assert_eq!(pos.ch[2].pattern, 3);
        assert_eq!(pos.ch[2].pitch, -12);
    }
}
