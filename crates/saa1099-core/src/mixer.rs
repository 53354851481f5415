//! Amplitude mixer and output stage
//!
//! Combines oscillator and noise states according to the per-channel enable
//! bits, applies the stereo amplitude nibbles (or the envelope generator on
//! channels 2 and 5) and sums everything per side.

use crate::registers::NUM_CHANNELS;

/// Largest value a single channel can contribute to one side.
pub const MAX_CHANNEL_LEVEL: u32 = 30;

/// Largest value of a summed side.
pub const MAX_MIX_LEVEL: u32 = MAX_CHANNEL_LEVEL * NUM_CHANNELS as u32;

/// Inputs of one channel for one host sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelInput {
    /// Amplitude register (low nibble left, high nibble right)
    pub amplitude: u8,
    /// Oscillator output
    pub tone: bool,
    /// Shared noise output of the channel's triplet
    pub noise: bool,
    /// Frequency enable bit
    pub tone_enabled: bool,
    /// Noise enable bit
    pub noise_enabled: bool,
    /// Envelope `(left, right)` levels when the channel is envelope-driven
    pub envelope: Option<(u8, u8)>,
}

impl ChannelInput {
    /// Intermediate level in {0, 1, 2} before amplitude scaling.
    #[inline]
    pub fn gate(&self) -> u32 {
        match (self.tone_enabled, self.noise_enabled) {
            (true, false) => (self.tone as u32) << 1,
            (false, true) => (self.noise as u32) << 1,
            (true, true) => match (self.tone, self.noise) {
                (false, _) => 0,
                (true, true) => 2,
                (true, false) => 1,
            },
            (false, false) if self.envelope.is_some() => 2,
            (false, false) => 0,
        }
    }
}

/// Per-channel mixer state
#[derive(Clone, Debug, Default)]
pub struct ChannelState {
    /// User mute flag
    pub muted: bool,
    /// Last `(left, right)` output normalised to 0.0..=1.0 (for visualisation)
    pub last_output: (f32, f32),
}

/// Audio mixer and output stage
#[derive(Clone, Debug, Default)]
pub struct Mixer {
    /// Per-channel state
    pub channels: [ChannelState; NUM_CHANNELS],
}

impl Mixer {
    /// Create a new mixer
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the `(left, right)` contribution of one channel.
    #[inline]
    pub fn mix_channel(&mut self, channel: usize, input: &ChannelInput) -> (u32, u32) {
        let state = &mut self.channels[channel];
        if state.muted {
            state.last_output = (0.0, 0.0);
            return (0, 0);
        }

        let gate = input.gate();
        let amp_left = (input.amplitude & 0x0F) as u32;
        let amp_right = (input.amplitude >> 4) as u32;

        let (left, right) = match input.envelope {
            Some((env_left, env_right)) => (
                ((amp_left & 0x0E) * env_left as u32 * gate) >> 4,
                ((amp_right & 0x0E) * env_right as u32 * gate) >> 4,
            ),
            None => (amp_left * gate, amp_right * gate),
        };

        state.last_output = (
            left as f32 / MAX_CHANNEL_LEVEL as f32,
            right as f32 / MAX_CHANNEL_LEVEL as f32,
        );
        (left, right)
    }

    /// Get the last output levels for all channels
    pub fn channel_outputs(&self) -> [(f32, f32); NUM_CHANNELS] {
        std::array::from_fn(|ch| self.channels[ch].last_output)
    }

    /// Set mute state for a channel
    #[inline]
    pub fn set_mute(&mut self, channel: usize, muted: bool) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.muted = muted;
        }
    }

    /// Check if channel is muted
    #[inline]
    pub fn is_muted(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.muted)
    }

    /// Reset mixer state
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.last_output = (0.0, 0.0);
            // Note: mute state preserved
        }
    }
}
