//! Unified chiptune player trait.
//!
//! - [`ChiptunePlayerBase`] is object-safe (`Box<dyn ChiptunePlayerBase>`)
//! - [`ChiptunePlayer`] adds the associated `Metadata` type
//!
//! Audio is exchanged as interleaved stereo `f32` frames, since every
//! SAA1099 channel has its own left and right amplitude.

use crate::{CHANNELS_PER_CHIP, DEFAULT_SAMPLE_RATE, PlaybackMetadata};

/// Playback state for chiptune players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Player is stopped (at beginning or end).
    #[default]
    Stopped,
    /// Player is actively playing.
    Playing,
    /// Player is paused (can resume).
    Paused,
}

/// Object-safe base trait for chiptune players.
///
/// # Example
///
/// ```ignore
/// use saa1099_common::{ChiptunePlayerBase, PlaybackState};
///
/// fn drain(player: &mut dyn ChiptunePlayerBase) {
///     player.play();
///     let mut buffer = vec![0.0; 2 * 882];
///     while player.state() == PlaybackState::Playing {
///         player.generate_samples_into(&mut buffer);
///         // ... hand the interleaved frames to an audio sink
///     }
/// }
/// ```
pub trait ChiptunePlayerBase: Send {
    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback (keeps position).
    fn pause(&mut self);

    /// Stop playback and rewind.
    fn stop(&mut self);

    /// Current playback state.
    fn state(&self) -> PlaybackState;

    /// Check if currently playing.
    fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Fill `buffer` with interleaved stereo samples (`L, R, L, R, ...`).
    ///
    /// A trailing odd slot is zeroed. Stopped or paused players write silence.
    fn generate_samples_into(&mut self, buffer: &mut [f32]);

    /// Generate `frames` interleaved stereo frames into a new buffer.
    fn generate_samples(&mut self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames * 2];
        self.generate_samples_into(&mut buffer);
        buffer
    }

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }

    /// Mute or unmute a channel (0-5). No-op unless overridden.
    fn set_channel_mute(&mut self, _channel: usize, _mute: bool) {}

    /// Check if a channel is muted.
    fn is_channel_muted(&self, _channel: usize) -> bool {
        false
    }

    /// Playback progress in 0.0..=1.0.
    fn playback_position(&self) -> f32 {
        0.0
    }

    /// Seek to a fraction of the song (0.0..=1.0).
    ///
    /// Returns `false` when seeking is unsupported or the target is invalid.
    fn seek(&mut self, _position: f32) -> bool {
        false
    }

    /// Total duration in seconds, 0.0 if unknown.
    fn duration_seconds(&self) -> f32 {
        0.0
    }

    /// Elapsed time derived from [`playback_position`](Self::playback_position).
    fn elapsed_seconds(&self) -> f32 {
        self.playback_position() * self.duration_seconds()
    }

    /// Number of audio channels produced by this player.
    fn channel_count(&self) -> usize {
        CHANNELS_PER_CHIP
    }
}

/// Player with access to format-specific metadata.
///
/// Not object-safe because of the associated type; use
/// [`ChiptunePlayerBase`] for trait objects.
pub trait ChiptunePlayer: ChiptunePlayerBase {
    /// The metadata type for this player.
    type Metadata: PlaybackMetadata;

    /// Get song metadata.
    fn metadata(&self) -> &Self::Metadata;
}
