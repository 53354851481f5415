//! Common traits and types for SAA1099 chiptune players.
//!
//! # Traits
//!
//! - [`ChiptunePlayer`] - Unified player interface
//! - [`PlaybackMetadata`] - Song facts: title, order length, loop point
//!
//! # Example
//!
//! ```ignore
//! use saa1099_common::{ChiptunePlayer, MetadataFields, PlaybackState};
//!
//! fn play_any<P: ChiptunePlayer>(player: &mut P) {
//!     println!("Playing: {}", player.metadata().title());
//!     player.play();
//!
//!     let mut buffer = vec![0.0; 4096];
//!     while player.state() == PlaybackState::Playing {
//!         player.generate_samples_into(&mut buffer);
//!         // ... send buffer to audio device
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod metadata;
mod player;

pub use metadata::{frames_to_seconds, MetadataFields, PlaybackMetadata};
pub use player::{ChiptunePlayer, ChiptunePlayerBase, PlaybackState};

// ============================================================================
// Common Constants
// ============================================================================

/// Standard audio sample rate (44.1 kHz CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// PAL frame rate (50 Hz), the SAM Coupé interrupt rate.
pub const FRAME_RATE_PAL: u32 = 50;

/// NTSC frame rate (60 Hz).
pub const FRAME_RATE_NTSC: u32 = 60;

/// Number of audio channels of one SAA1099.
pub const CHANNELS_PER_CHIP: usize = 6;
