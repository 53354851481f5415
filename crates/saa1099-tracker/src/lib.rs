//! SAA1099 tracker song store and tick-based player
//!
//! This crate plays tracker songs on the Philips SAA1099 (SAM Coupé sound chip).
//! A song is built from samples, ornaments, patterns and positions; the player
//! steps it at the interrupt rate and turns every tick into a complete chip
//! register image.
//!
//! # Features
//!
//! - Six-channel song store with reserved silent entries
//! - Compact text rows for samples, ornaments and tracklines
//! - Full effect set: portamento, glissando, vibrato, tremolo, volume slide,
//!   false chords, delays, envelopes, noise and swing speeds
//! - Song, position, line and sample-audition transport
//! - Exact seeking through cached position entry states
//! - Silent whole-song simulation with per-frame register traces
//!
//! # Quick Start
//!
//! ```
//! use saa1099_tracker::{Pattern, Player, PlayerConfig, Position, Sample, Song};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut song = Song::new("Demo", "Someone");
//! song.set_sample(1, Sample::parse(&["FF1.+000", "CC1.+000"])?.with_loop(1))?;
//! let pat = song.add_pattern();
//! song.set_pattern(pat, Pattern::parse(&["37010000000", "00000000000"])?)?;
//! song.add_position(Position::new(2, 6)?.with_channel(0, pat, 0));
//!
//! let mut player = Player::new(song, PlayerConfig::default())?;
//! let frames = player.simulate_playback(|_regs| {}, || {});
//! assert_eq!(frames, 12);
//!
//! player.play_position(true, true, true);
//! let mut left = vec![0.0; 882];
//! let mut right = vec![0.0; 882];
//! player.get_audio(&mut left, &mut right, 882);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Public modules
pub mod config;
pub mod effects;
pub mod error;
pub mod player;
pub mod runtime;
pub mod song;
pub mod tables;

// Re-export public API (explicit, no star exports)
pub use config::{PlayerConfig, NTSC_INTERRUPT_RATE, PAL_INTERRUPT_RATE};
pub use effects::EffectKind;
pub use error::{Result, TrackerError};
pub use player::{Player, PlayerMode, SimulationGuard, TrackerMetadata};
pub use runtime::{ChannelState, DelayedTrigger, Runtime};
pub use song::{
    Ornament, Pattern, Position, PositionChannel, Sample, SampleTick, Song, Speed, StereoVolume,
    Trackline,
};
pub use tables::{tone_word, wrap_tone};

// Re-export the chip model and unified player traits
pub use saa1099::{ChannelMask, Register, RegisterFile, Saa1099, Saa1099Backend};
pub use saa1099_common::{ChiptunePlayer, ChiptunePlayerBase, PlaybackMetadata, PlaybackState};
