//! Backend trait abstraction for SAA1099 chip implementations
//!
//! The sequencer only talks to the chip through this interface, so a
//! different synthesis core (or a register logger) can be dropped in.

use crate::registers::{NUM_CHANNELS, RegisterSnapshot};

/// Common interface for SAA1099 chip backends
///
/// # Example
///
/// ```
/// use saa1099::{Saa1099, Saa1099Backend};
///
/// fn play_note<B: Saa1099Backend>(chip: &mut B) {
///     chip.write_register(0x00, 0xFF); // Channel 0 amplitude, both sides
///     chip.write_register(0x08, 227); // Channel 0 offset (A)
///     chip.write_register(0x10, 0x03); // Channel 0 octave 3
///     chip.write_register(0x14, 0x01); // Frequency enable channel 0
///     chip.write_register(0x1C, 0x01); // Sound enable
///
///     let mut left = [0.0f32; 64];
///     let mut right = [0.0f32; 64];
///     chip.render(&mut left, &mut right);
/// }
///
/// play_note(&mut Saa1099::new());
/// ```
pub trait Saa1099Backend: Send {
    /// Create a backend with default clocks (8 MHz chip, 44.1 kHz output)
    fn new() -> Self
    where
        Self: Sized;

    /// Create a backend with a custom chip clock and sample rate
    fn with_clocks(clock: u32, sample_rate: u32) -> Self
    where
        Self: Sized;

    /// Reset the backend to its power-on state
    fn reset(&mut self);

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Write to a register; addresses without a function are ignored.
    fn write_register(&mut self, addr: u8, value: u8);

    /// Read back a register, or 0x00 for addresses without a function.
    fn read_register(&self, addr: u8) -> u8;

    /// Apply a full register image and the mute flags in one step.
    fn set_all_regs(&mut self, snapshot: &RegisterSnapshot);

    /// Capture the full register image and the mute flags.
    fn get_all_regs(&self) -> RegisterSnapshot;

    /// Render stereo frames into both buffers (`min(left.len(), right.len())` frames).
    fn render(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Mute or unmute a channel (0-5)
    fn set_channel_mute(&mut self, channel: usize, mute: bool);

    /// Check if a channel is muted
    fn is_channel_muted(&self, channel: usize) -> bool;

    /// Last per-channel `(left, right)` output levels
    fn channel_outputs(&self) -> [(f32, f32); NUM_CHANNELS] {
        [(0.0, 0.0); NUM_CHANNELS]
    }
}
