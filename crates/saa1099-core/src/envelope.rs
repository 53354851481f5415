//! SAA1099 Envelope Generator
//!
//! Two generators exist, one per channel triplet. Generator 0 modulates
//! channel 2 and is clocked by oscillator 1, generator 1 modulates channel 5
//! and is clocked by oscillator 4 (or by address writes in external mode).
//!
//! Control byte layout (registers 0x18/0x19):
//!
//! | bit | meaning |
//! |-----|---------|
//! | 7   | enable |
//! | 5   | external clock |
//! | 4   | 3-bit resolution |
//! | 3-1 | shape |
//! | 0   | invert right side |

use bitflags::bitflags;

bitflags! {
    /// Flag bits of the envelope control byte (shape bits excluded).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EnvelopeControl: u8 {
        /// Right side outputs the inverted waveform
        const INVERT_RIGHT = 0x01;
        /// Step in pairs (8 levels per phase instead of 16)
        const RESOLUTION_3BIT = 0x10;
        /// Stepped by address writes instead of the linked oscillator
        const EXTERNAL_CLOCK = 0x20;
        /// Generator enabled
        const ENABLE = 0x80;
    }
}

/// Waveform selected by bits 1-3 of the control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeShape {
    /// Output held at zero
    #[default]
    Zero,
    /// Output held at maximum
    Maximum,
    /// One decay, then zero
    SingleDecay,
    /// Repeating decay (sawtooth down)
    RepetitiveDecay,
    /// One attack plus decay, then zero
    SingleTriangle,
    /// Repeating attack plus decay
    RepetitiveTriangle,
    /// One attack, then zero
    SingleAttack,
    /// Repeating attack (sawtooth up)
    RepetitiveAttack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ramp {
    Hold(u8),
    Up,
    Down,
}

impl EnvelopeShape {
    /// Decode the shape from a control byte.
    pub fn from_control(value: u8) -> Self {
        match (value >> 1) & 7 {
            0 => Self::Zero,
            1 => Self::Maximum,
            2 => Self::SingleDecay,
            3 => Self::RepetitiveDecay,
            4 => Self::SingleTriangle,
            5 => Self::RepetitiveTriangle,
            6 => Self::SingleAttack,
            _ => Self::RepetitiveAttack,
        }
    }

    fn phases(self) -> &'static [Ramp] {
        match self {
            Self::Zero => &[Ramp::Hold(0)],
            Self::Maximum => &[Ramp::Hold(15)],
            Self::SingleDecay | Self::RepetitiveDecay => &[Ramp::Down],
            Self::SingleTriangle | Self::RepetitiveTriangle => &[Ramp::Up, Ramp::Down],
            Self::SingleAttack | Self::RepetitiveAttack => &[Ramp::Up],
        }
    }

    fn repeats(self) -> bool {
        matches!(
            self,
            Self::Zero
                | Self::Maximum
                | Self::RepetitiveDecay
                | Self::RepetitiveTriangle
                | Self::RepetitiveAttack
        )
    }
}

/// Envelope generator state machine.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeGenerator {
    control: u8,
    /// Control byte waiting for the end of the running phase
    pending: Option<u8>,
    phase: usize,
    step: u8,
    finished: bool,
}

impl EnvelopeGenerator {
    /// Create a disabled generator.
    pub fn new() -> Self {
        Self::default()
    }

    fn flags(&self) -> EnvelopeControl {
        EnvelopeControl::from_bits_truncate(self.control)
    }

    /// Whether the generator modulates its channel.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags().contains(EnvelopeControl::ENABLE)
    }

    /// Whether the generator is stepped by address writes.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.flags().contains(EnvelopeControl::EXTERNAL_CLOCK)
    }

    /// Active control byte.
    pub fn control(&self) -> u8 {
        self.control
    }

    /// Active waveform.
    pub fn shape(&self) -> EnvelopeShape {
        EnvelopeShape::from_control(self.control)
    }

    /// Write the control byte.
    ///
    /// A running generator keeps its current waveform until the phase ends;
    /// a stopped one (or a write that disables it) takes effect at once.
    pub fn write_control(&mut self, value: u8) {
        let enabling = value & EnvelopeControl::ENABLE.bits() != 0;
        if self.is_enabled() && enabling {
            self.pending = Some(value);
        } else {
            self.apply(value);
        }
    }

    fn apply(&mut self, value: u8) {
        self.control = value;
        self.pending = None;
        self.phase = 0;
        self.step = 0;
        self.finished = false;
    }

    /// Step from the linked oscillator (ignored in external mode).
    #[inline]
    pub fn clock_internal(&mut self, flips: u32) {
        if self.is_enabled() && !self.is_external() {
            for _ in 0..flips {
                self.advance();
            }
        }
    }

    /// Step from an address-latch write (ignored in internal mode).
    #[inline]
    pub fn clock_external(&mut self) {
        if self.is_enabled() && self.is_external() {
            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.finished {
            if let Some(value) = self.pending {
                self.apply(value);
            }
            return;
        }

        let increment = if self.flags().contains(EnvelopeControl::RESOLUTION_3BIT) {
            2
        } else {
            1
        };
        self.step += increment;
        if self.step < 16 {
            return;
        }

        self.step = 0;
        if let Some(value) = self.pending {
            self.apply(value);
            return;
        }

        let shape = self.shape();
        self.phase += 1;
        if self.phase >= shape.phases().len() {
            if shape.repeats() {
                self.phase = 0;
            } else {
                self.finished = true;
            }
        }
    }

    /// Current 4-bit level before side inversion.
    #[inline]
    pub fn level(&self) -> u8 {
        if self.finished {
            return 0;
        }
        let raw = match self.shape().phases()[self.phase] {
            Ramp::Hold(level) => level,
            Ramp::Up => self.step,
            Ramp::Down => 15 - self.step,
        };
        if self.flags().contains(EnvelopeControl::RESOLUTION_3BIT) {
            raw & 0x0E
        } else {
            raw
        }
    }

    /// Current `(left, right)` levels.
    #[inline]
    pub fn output(&self) -> (u8, u8) {
        let level = self.level();
        if self.flags().contains(EnvelopeControl::INVERT_RIGHT) {
            (level, 15 - level)
        } else {
            (level, level)
        }
    }

    /// Reset to the disabled power-on state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
