//! SAA1099 Register Definitions
//!
//! The chip decodes 32 addresses but only 21 of them are wired to anything.
//! [`Register`] enumerates exactly those, so a register image can be a plain
//! fixed-size array instead of a sparse map.

use std::fmt;

use bitflags::bitflags;

/// Number of channels on the chip.
pub const NUM_CHANNELS: usize = 6;

bitflags! {
    /// Per-channel bits of the frequency and noise enable registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelMask: u8 {
        /// Channel 0
        const CH0 = 0x01;
        /// Channel 1
        const CH1 = 0x02;
        /// Channel 2
        const CH2 = 0x04;
        /// Channel 3
        const CH3 = 0x08;
        /// Channel 4
        const CH4 = 0x10;
        /// Channel 5
        const CH5 = 0x20;
    }
}

impl ChannelMask {
    /// Mask holding only `channel`; empty past the last channel.
    pub fn channel(channel: usize) -> Self {
        if channel < NUM_CHANNELS {
            Self::from_bits_truncate(1 << channel)
        } else {
            Self::empty()
        }
    }
}

/// Number of addressable registers that have a function.
pub const NUM_REGISTERS: usize = 21;

/// SAA1099 register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    /// Channel 0 amplitude (low nibble left, high nibble right)
    Amplitude0 = 0x00,
    /// Channel 1 amplitude
    Amplitude1 = 0x01,
    /// Channel 2 amplitude
    Amplitude2 = 0x02,
    /// Channel 3 amplitude
    Amplitude3 = 0x03,
    /// Channel 4 amplitude
    Amplitude4 = 0x04,
    /// Channel 5 amplitude
    Amplitude5 = 0x05,
    /// Channel 0 frequency offset
    Frequency0 = 0x08,
    /// Channel 1 frequency offset
    Frequency1 = 0x09,
    /// Channel 2 frequency offset
    Frequency2 = 0x0A,
    /// Channel 3 frequency offset
    Frequency3 = 0x0B,
    /// Channel 4 frequency offset
    Frequency4 = 0x0C,
    /// Channel 5 frequency offset
    Frequency5 = 0x0D,
    /// Octave of channels 0 (low nibble) and 1 (high nibble)
    Octave01 = 0x10,
    /// Octave of channels 2 and 3
    Octave23 = 0x11,
    /// Octave of channels 4 and 5
    Octave45 = 0x12,
    /// Frequency (tone) enable bits, one per channel
    FrequencyEnable = 0x14,
    /// Noise enable bits, one per channel
    NoiseEnable = 0x15,
    /// Noise generator clock select (bits 0-1 generator 0, bits 4-5 generator 1)
    NoiseGenerator = 0x16,
    /// Envelope generator 0 control (drives channel 2)
    Envelope0 = 0x18,
    /// Envelope generator 1 control (drives channel 5)
    Envelope1 = 0x19,
    /// Bit 0 sound enable, bit 1 sync/reset all oscillators
    Control = 0x1C,
}

impl Register {
    /// All valid registers in address order.
    pub const ALL: [Register; NUM_REGISTERS] = [
        Register::Amplitude0,
        Register::Amplitude1,
        Register::Amplitude2,
        Register::Amplitude3,
        Register::Amplitude4,
        Register::Amplitude5,
        Register::Frequency0,
        Register::Frequency1,
        Register::Frequency2,
        Register::Frequency3,
        Register::Frequency4,
        Register::Frequency5,
        Register::Octave01,
        Register::Octave23,
        Register::Octave45,
        Register::FrequencyEnable,
        Register::NoiseEnable,
        Register::NoiseGenerator,
        Register::Envelope0,
        Register::Envelope1,
        Register::Control,
    ];

    /// Convert a raw address (only the low 5 bits are decoded) to a register.
    pub fn from_addr(addr: u8) -> Option<Self> {
        match addr & 0x1F {
            a @ 0x00..=0x05 => Some(Self::amplitude(a as usize)),
            a @ 0x08..=0x0D => Some(Self::frequency((a - 0x08) as usize)),
            a @ 0x10..=0x12 => Some(Self::octave(((a - 0x10) * 2) as usize)),
            0x14 => Some(Register::FrequencyEnable),
            0x15 => Some(Register::NoiseEnable),
            0x16 => Some(Register::NoiseGenerator),
            0x18 => Some(Register::Envelope0),
            0x19 => Some(Register::Envelope1),
            0x1C => Some(Register::Control),
            _ => None,
        }
    }

    /// Amplitude register of a channel (0-5, wraps).
    pub fn amplitude(channel: usize) -> Self {
        Self::ALL[channel % NUM_CHANNELS]
    }

    /// Frequency offset register of a channel (0-5, wraps).
    pub fn frequency(channel: usize) -> Self {
        Self::ALL[NUM_CHANNELS + channel % NUM_CHANNELS]
    }

    /// Octave register shared by a channel and its pair partner.
    pub fn octave(channel: usize) -> Self {
        Self::ALL[2 * NUM_CHANNELS + (channel % NUM_CHANNELS) / 2]
    }

    /// Envelope control register of a channel triplet (0 or 1).
    pub fn envelope(generator: usize) -> Self {
        if generator & 1 == 0 {
            Register::Envelope0
        } else {
            Register::Envelope1
        }
    }

    /// Get the register address value.
    pub fn addr(&self) -> u8 {
        *self as u8
    }

    /// Dense index of this register (0..NUM_REGISTERS).
    pub fn index(&self) -> usize {
        match self.addr() {
            a @ 0x00..=0x05 => a as usize,
            a @ 0x08..=0x0D => a as usize - 2,
            a @ 0x10..=0x12 => a as usize - 4,
            a @ 0x14..=0x16 => a as usize - 5,
            a @ 0x18..=0x19 => a as usize - 6,
            _ => NUM_REGISTERS - 1,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Amplitude0
            | Register::Amplitude1
            | Register::Amplitude2
            | Register::Amplitude3
            | Register::Amplitude4
            | Register::Amplitude5 => {
                write!(f, "R{:02X} (Channel {} Amplitude)", self.addr(), self.addr())
            }
            Register::Frequency0
            | Register::Frequency1
            | Register::Frequency2
            | Register::Frequency3
            | Register::Frequency4
            | Register::Frequency5 => write!(
                f,
                "R{:02X} (Channel {} Frequency)",
                self.addr(),
                self.addr() - 0x08
            ),
            Register::Octave01 | Register::Octave23 | Register::Octave45 => {
                let lo = (self.addr() - 0x10) * 2;
                write!(f, "R{:02X} (Octave {}/{})", self.addr(), lo, lo + 1)
            }
            Register::FrequencyEnable => write!(f, "R14 (Frequency Enable)"),
            Register::NoiseEnable => write!(f, "R15 (Noise Enable)"),
            Register::NoiseGenerator => write!(f, "R16 (Noise Generator Clock)"),
            Register::Envelope0 => write!(f, "R18 (Envelope Generator 0)"),
            Register::Envelope1 => write!(f, "R19 (Envelope Generator 1)"),
            Register::Control => write!(f, "R1C (Sound Enable / Sync)"),
        }
    }
}

/// Register image with change tracking.
///
/// Values live in a dense array. Every write that changes a value marks the
/// register dirty and appends it to a write-order log, so trace consumers can
/// diff against the previous snapshot in the order the sequencer wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    values: [u8; NUM_REGISTERS],
    dirty: u32,
    order: Vec<Register>,
}

impl RegisterFile {
    /// Create an all-zero register image with nothing marked changed.
    pub fn new() -> Self {
        Self {
            values: [0; NUM_REGISTERS],
            dirty: 0,
            order: Vec::with_capacity(NUM_REGISTERS),
        }
    }

    /// Read a register value.
    #[inline]
    pub fn read(&self, reg: Register) -> u8 {
        self.values[reg.index()]
    }

    /// Write a register value, recording it when the value changes.
    #[inline]
    pub fn write(&mut self, reg: Register, value: u8) {
        let idx = reg.index();
        if self.values[idx] == value {
            return;
        }
        self.values[idx] = value;
        self.mark(reg);
    }

    fn mark(&mut self, reg: Register) {
        let bit = 1u32 << reg.index();
        if self.dirty & bit == 0 {
            self.dirty |= bit;
            self.order.push(reg);
        }
    }

    /// Whether a register changed since the last [`take_changes`](Self::take_changes).
    pub fn is_changed(&self, reg: Register) -> bool {
        self.dirty & (1 << reg.index()) != 0
    }

    /// Whether any register changed since the last snapshot.
    pub fn has_changes(&self) -> bool {
        self.dirty != 0
    }

    /// Changed registers with their current values, in first-write order.
    pub fn changes(&self) -> impl Iterator<Item = (Register, u8)> + '_ {
        self.order.iter().map(|&reg| (reg, self.read(reg)))
    }

    /// Collect and clear the pending changes.
    pub fn take_changes(&mut self) -> Vec<(Register, u8)> {
        let out = self.changes().collect();
        self.clear_changes();
        out
    }

    /// Forget pending changes without collecting them.
    pub fn clear_changes(&mut self) {
        self.dirty = 0;
        self.order.clear();
    }

    /// Mark every register as changed (used after wholesale replacement).
    pub fn mark_all_changed(&mut self) {
        for reg in Register::ALL {
            self.mark(reg);
        }
    }

    /// Iterate all registers with their values in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u8)> + '_ {
        Register::ALL.iter().map(|&reg| (reg, self.read(reg)))
    }

    /// Reset all values to zero and forget pending changes.
    pub fn clear(&mut self) {
        self.values = [0; NUM_REGISTERS];
        self.dirty = 0;
        self.order.clear();
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Register image plus per-channel mute flags, exchanged atomically with the chip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// Register values
    pub regs: RegisterFile,
    /// Per-channel user mute
    pub mute: [bool; NUM_CHANNELS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_conversion() {
        assert_eq!(Register::from_addr(0x00), Some(Register::Amplitude0));
        assert_eq!(Register::from_addr(0x0D), Some(Register::Frequency5));
        assert_eq!(Register::from_addr(0x11), Some(Register::Octave23));
        assert_eq!(Register::from_addr(0x1C), Some(Register::Control));
        assert_eq!(Register::from_addr(0x06), None);
        assert_eq!(Register::from_addr(0x13), None);
        assert_eq!(Register::from_addr(0x3C), Some(Register::Control)); // Only 5 bits decoded
    }

    #[test]
    fn test_dense_index_is_a_bijection() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.index(), i, "{reg}");
            assert_eq!(Register::from_addr(reg.addr()), Some(*reg));
        }
    }

    #[test]
    fn test_channel_helpers() {
        assert_eq!(Register::amplitude(3), Register::Amplitude3);
        assert_eq!(Register::frequency(5), Register::Frequency5);
        assert_eq!(Register::octave(0), Register::Octave01);
        assert_eq!(Register::octave(1), Register::Octave01);
        assert_eq!(Register::octave(4), Register::Octave45);
        assert_eq!(Register::envelope(1), Register::Envelope1);
    }

    #[test]
    fn test_channel_mask_bits() {
        assert_eq!(ChannelMask::channel(0), ChannelMask::CH0);
        assert_eq!(ChannelMask::channel(5).bits(), 0x20);
        assert!(ChannelMask::channel(6).is_empty());

        let mut mask = ChannelMask::empty();
        mask.insert(ChannelMask::channel(1));
        mask.insert(ChannelMask::channel(4));
        assert_eq!(mask.bits(), 0x12);
        // the two unused register bits are dropped
        assert_eq!(ChannelMask::from_bits_truncate(0xFF), ChannelMask::all());
        assert_eq!(ChannelMask::all().bits(), 0x3F);
    }

    #[test]
    fn test_change_tracking_keeps_write_order() {
        let mut file = RegisterFile::new();
        file.write(Register::Control, 1);
        file.write(Register::Amplitude2, 0x33);
        file.write(Register::Control, 1); // unchanged
        file.write(Register::Amplitude2, 0x44);

        let changes = file.take_changes();
        assert_eq!(
            changes,
            vec![(Register::Control, 1), (Register::Amplitude2, 0x44)]
        );
        assert!(!file.has_changes());

        file.write(Register::Control, 1);
        assert!(!file.has_changes(), "same value must not be reported");
    }
}
