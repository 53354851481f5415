//! Song store: samples, ornaments, patterns and positions.
//!
//! Entry 0 of the sample, ornament and pattern tables is reserved and
//! always silent; lookups past a table fall back to it, so the sequencer
//! never has to fail on bad indices.

mod compact;
mod ornament;
mod pattern;
mod position;
mod sample;

pub use compact::MAX_SHIFT;
pub use ornament::Ornament;
pub use pattern::{Pattern, Trackline};
pub use position::{Position, PositionChannel, Speed};
pub use sample::{Sample, SampleTick, StereoVolume};

use serde::{Deserialize, Serialize};

use crate::effects::{EffectKind, CMD_BREAK, CMD_SPEED};
use crate::error::{Result, TrackerError};

/// Sample table size (index 0 reserved).
pub const MAX_SAMPLES: usize = 32;
/// Ornament table size (index 0 reserved).
pub const MAX_ORNAMENTS: usize = 16;
/// Lines per pattern.
pub const MAX_PATTERN_LINES: usize = 128;
/// Highest tone index.
pub const MAX_TONE: u8 = 96;
/// Ticks per sample/ornament.
pub const TICKS: usize = 256;
/// Channels of the chip.
pub const CHANNELS: usize = 6;

// Reserved entries, independent of what the public tables hold.
static SILENT_SAMPLE: Sample = Sample::silent();
static EMPTY_ORNAMENT: Ornament = Ornament::empty();
static EMPTY_PATTERN: Pattern = Pattern::empty();

/// A complete song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Song title
    pub title: String,
    /// Author name
    pub author: String,
    /// Sample table, [`MAX_SAMPLES`] entries
    pub samples: Vec<Sample>,
    /// Ornament table, [`MAX_ORNAMENTS`] entries
    pub ornaments: Vec<Ornament>,
    /// Pattern table, entry 0 reserved
    pub patterns: Vec<Pattern>,
    /// Composition order
    pub positions: Vec<Position>,
    /// Position song playback wraps to
    pub repeat_position: usize,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            samples: vec![Sample::default(); MAX_SAMPLES],
            ornaments: vec![Ornament::default(); MAX_ORNAMENTS],
            patterns: vec![Pattern::default()],
            positions: Vec::new(),
            repeat_position: 0,
        }
    }
}

impl Song {
    /// Create an empty song.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Lookups with reserved-entry substitution
    // ------------------------------------------------------------------

    /// Sample `index`, or the reserved silent sample.
    pub fn sample(&self, index: usize) -> &Sample {
        match index {
            0 => &SILENT_SAMPLE,
            _ => self.samples.get(index).unwrap_or(&SILENT_SAMPLE),
        }
    }

    /// Ornament `index`, or the reserved empty ornament.
    pub fn ornament(&self, index: usize) -> &Ornament {
        match index {
            0 => &EMPTY_ORNAMENT,
            _ => self.ornaments.get(index).unwrap_or(&EMPTY_ORNAMENT),
        }
    }

    /// Pattern `index`, or the reserved empty pattern.
    pub fn pattern(&self, index: usize) -> &Pattern {
        match index {
            0 => &EMPTY_PATTERN,
            _ => self.patterns.get(index).unwrap_or(&EMPTY_PATTERN),
        }
    }

    /// Trackline a channel reads at a pattern line of a position.
    pub fn trackline(&self, position: usize, channel: usize, line: usize) -> Trackline {
        self.positions
            .get(position)
            .and_then(|pos| pos.ch.get(channel))
            .map_or_else(Trackline::default, |ch| self.pattern(ch.pattern).line(line))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Store a sample in slots 1..[`MAX_SAMPLES`].
    pub fn set_sample(&mut self, index: usize, sample: Sample) -> Result<()> {
        if index == 0 || index >= MAX_SAMPLES {
            return Err(TrackerError::IndexOutOfRange {
                what: "sample",
                index,
                available: MAX_SAMPLES,
            });
        }
        if self.samples.len() < MAX_SAMPLES {
            self.samples.resize(MAX_SAMPLES, Sample::default());
        }
        self.samples[index] = sample;
        self.invalidate_position_states(0);
        Ok(())
    }

    /// Store an ornament in slots 1..[`MAX_ORNAMENTS`].
    pub fn set_ornament(&mut self, index: usize, ornament: Ornament) -> Result<()> {
        if index == 0 || index >= MAX_ORNAMENTS {
            return Err(TrackerError::IndexOutOfRange {
                what: "ornament",
                index,
                available: MAX_ORNAMENTS,
            });
        }
        if self.ornaments.len() < MAX_ORNAMENTS {
            self.ornaments.resize(MAX_ORNAMENTS, Ornament::default());
        }
        self.ornaments[index] = ornament;
        self.invalidate_position_states(0);
        Ok(())
    }

    /// Append an empty pattern and return its index.
    pub fn add_pattern(&mut self) -> usize {
        if self.patterns.is_empty() {
            self.patterns.push(Pattern::default());
        }
        self.patterns.push(Pattern::default());
        self.patterns.len() - 1
    }

    /// Replace a pattern (index 0 is reserved).
    pub fn set_pattern(&mut self, index: usize, pattern: Pattern) -> Result<()> {
        if index == 0 || index >= self.patterns.len() {
            return Err(TrackerError::IndexOutOfRange {
                what: "pattern",
                index,
                available: self.patterns.len(),
            });
        }
        self.patterns[index] = pattern;
        self.invalidate_position_states(0);
        Ok(())
    }

    /// Append a position, count its frames and return its index.
    pub fn add_position(&mut self, position: Position) -> usize {
        self.positions.push(position);
        let index = self.positions.len() - 1;
        self.count_position_frames(index);
        index
    }

    /// Remove all patterns and positions.
    pub fn clear_song(&mut self) {
        self.patterns = vec![Pattern::default()];
        self.positions.clear();
        self.repeat_position = 0;
    }

    /// Reset the sample table.
    pub fn clear_samples(&mut self) {
        self.samples = vec![Sample::default(); MAX_SAMPLES];
        self.invalidate_position_states(0);
    }

    /// Reset the ornament table.
    pub fn clear_ornaments(&mut self) {
        self.ornaments = vec![Ornament::default(); MAX_ORNAMENTS];
        self.invalidate_position_states(0);
    }

    /// Drop cached entry states of positions `from..`.
    pub fn invalidate_position_states(&mut self, from: usize) {
        for position in self.positions.iter_mut().skip(from) {
            position.initial_state = None;
        }
    }

    // ------------------------------------------------------------------
    // Timing
    // ------------------------------------------------------------------

    /// Recompute the cumulative tick table of a position.
    ///
    /// Follows the sequencer exactly: per-channel line cursors honour
    /// break-to-line, and a valid speed effect changes the tick count of
    /// the line it sits on (the highest channel wins).
    pub fn count_position_frames(&mut self, index: usize) {
        let Some(position) = self.positions.get(index) else {
            return;
        };
        let mut speed = position.speed;
        let mut cursors = [0usize; CHANNELS];
        let mut frames = Vec::with_capacity(position.length + 1);
        let mut elapsed = 0u32;

        for line in 0..position.length {
            frames.push(elapsed);
            for (channel, cursor) in cursors.iter_mut().enumerate() {
                let row = self.pattern(position.ch[channel].pattern).line(*cursor);
                match (row.cmd, EffectKind::decode(row.cmd, row.param)) {
                    (CMD_SPEED, Some(EffectKind::Speed(new))) => speed = new,
                    (CMD_BREAK, Some(EffectKind::BreakToLine(target)))
                        if (target as usize) < *cursor =>
                    {
                        *cursor = target as usize;
                        continue;
                    }
                    _ => {}
                }
                *cursor += 1;
            }
            elapsed += speed.ticks_for_line(line) as u32;
        }
        frames.push(elapsed);

        self.positions[index].frames = frames;
    }

    /// Recompute the tick tables of every position.
    pub fn count_all_frames(&mut self) {
        for index in 0..self.positions.len() {
            self.count_position_frames(index);
        }
    }

    /// Ticks of one pass through the whole song.
    pub fn total_ticks(&self) -> u64 {
        self.positions.iter().map(|p| p.total_frames() as u64).sum()
    }

    /// Ticks elapsed before a position starts.
    pub fn position_start_tick(&self, index: usize) -> u64 {
        self.positions
            .iter()
            .take(index)
            .map(|p| p.total_frames() as u64)
            .sum()
    }

    /// Position and line playing at an absolute tick.
    pub fn locate_tick(&self, tick: u64) -> Option<(usize, usize)> {
        let mut start = 0u64;
        for (index, position) in self.positions.iter().enumerate() {
            let total = position.total_frames() as u64;
            if tick < start + total {
                let offset = (tick - start) as u32;
                let line = position
                    .frames
                    .iter()
                    .rposition(|&f| f <= offset)
                    .unwrap_or(0)
                    .min(position.length.saturating_sub(1));
                return Some((index, line));
            }
            start += total;
        }
        None
    }
}
