//! Runtime snapshot: per-channel sequencer state plus the register image.
//!
//! A [`Runtime`] is owned by the player and replaced wholesale when playback
//! jumps to a position's stored entry state.

use saa1099::RegisterFile;

use crate::effects::{ActiveEffect, VolumeSlide};
use crate::song::{StereoVolume, CHANNELS};

/// A trigger deferred by the delay effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayedTrigger {
    /// Tone to start (0 = none)
    pub tone: u8,
    /// Sample index (0 = keep)
    pub sample: u8,
    /// Ornament index (0 = keep)
    pub ornament: u8,
    /// Volume byte (0 = keep)
    pub volume: u8,
    /// Release flag of the line
    pub release: bool,
    /// Ornament release flag of the line
    pub ornament_release: bool,
    /// Ticks left before the trigger fires
    pub countdown: u8,
}

/// Live state of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Current tone (0 = none)
    pub tone: u8,
    /// Whether a sample is sounding
    pub playing: bool,
    /// Sample index
    pub sample: usize,
    /// Ornament index
    pub ornament: usize,
    /// Next sample tick
    pub sample_cursor: usize,
    /// Next ornament tick
    pub ornament_cursor: usize,
    /// Ticks the ornament is held before it advances
    pub ornament_wait: u8,
    /// Ornament ran out (or was released) without a loop
    pub ornament_done: bool,
    /// Attenuation loaded from tracklines
    pub attenuation: StereoVolume,
    /// Persistent fine-shift accumulator (portamento, glissando)
    pub shift: i16,
    /// Semitone transpose of the current position
    pub pitch: i8,
    /// Sample released into its tail
    pub released: bool,
    /// Pattern line this channel reads next
    pub line: usize,
    /// Latched continuous effect
    pub effect: Option<ActiveEffect>,
    /// Running volume slide
    pub slide: Option<VolumeSlide>,
    /// Volume slide accumulator (−15..=15, positive attenuates)
    pub volume_slide: i8,
    /// Left/right outputs exchanged
    pub stereo_swap: bool,
    /// Noise rate forced on the channel's triplet
    pub noise_override: Option<u8>,
    /// Hardware envelope control byte while enabled
    pub envelope: Option<u8>,
    /// Trigger waiting for its delay to elapse
    pub delayed: Option<DelayedTrigger>,
}

impl ChannelState {
    /// Whether the channel makes (or is about to make) sound.
    pub fn is_audible(&self) -> bool {
        self.playing || self.delayed.is_some()
    }
}

/// Per-channel state and register image of one sequencer instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Runtime {
    /// Register image written by the sequencer
    pub regs: RegisterFile,
    /// Channel blocks
    pub channels: [ChannelState; CHANNELS],
}

impl Runtime {
    /// Create a silent runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copy `other` into this runtime.
    pub fn replace(&mut self, other: &Runtime) {
        self.regs.clone_from(&other.regs);
        self.channels.clone_from(&other.channels);
    }

    /// Restore one channel to defaults, keeping its pattern cursor and
    /// transpose.
    pub fn reset_channel(&mut self, channel: usize) {
        if let Some(state) = self.channels.get_mut(channel) {
            let (line, pitch) = (state.line, state.pitch);
            *state = ChannelState {
                line,
                pitch,
                ..ChannelState::default()
            };
        }
    }

    /// Silence every channel and clear the register image.
    pub fn reset(&mut self) {
        self.channels = Default::default();
        self.regs.clear();
    }

    /// Whether any channel is playing or has a pending trigger.
    pub fn is_audible(&self) -> bool {
        self.channels.iter().any(ChannelState::is_audible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saa1099::Register;

    #[test]
    fn test_replace_is_deep() {
        let mut source = Runtime::new();
        source.channels[2].tone = 37;
        source.channels[2].playing = true;
        source.regs.write(Register::Amplitude2, 0xFF);

        let mut live = Runtime::new();
        live.replace(&source);
        source.channels[2].tone = 1;

        assert_eq!(live.channels[2].tone, 37);
        assert_eq!(live.regs.read(Register::Amplitude2), 0xFF);
        assert!(live.is_audible());
    }

    #[test]
    fn test_reset_channel_keeps_cursor() {
        let mut rt = Runtime::new();
        rt.channels[1] = ChannelState {
            tone: 12,
            playing: true,
            line: 5,
            pitch: -3,
            stereo_swap: true,
            ..ChannelState::default()
        };
        rt.reset_channel(1);
        assert!(!rt.channels[1].playing);
        assert!(!rt.channels[1].stereo_swap);
        assert_eq!(rt.channels[1].line, 5);
        assert_eq!(rt.channels[1].pitch, -3);
        rt.reset_channel(99);
    }

    #[test]
    fn test_pending_trigger_counts_as_audible() {
        let mut rt = Runtime::new();
        assert!(!rt.is_audible());
        rt.channels[4].delayed = Some(DelayedTrigger {
            countdown: 3,
            ..DelayedTrigger::default()
        });
        assert!(rt.is_audible());
        rt.reset();
        assert!(!rt.is_audible());
    }
}
