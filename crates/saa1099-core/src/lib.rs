//! SAA1099 PSG Emulator
//!
//! A sample-stepped model of the Philips SAA1099 Programmable Sound Generator
//! as found in the SAM Coupé and on Creative Music System / Game Blaster cards.
//!
//! # Features
//! - Six square-wave channels with buffered octave/offset updates
//! - Two 17-bit LFSR noise generators (fixed rates or oscillator-synced)
//! - Two envelope generators with all eight shapes, 3-bit mode and stereo inversion
//! - Stereo amplitude mixer with optional DC blocker
//! - Change-tracked register image for tracing and snapshotting
//!
//! # Backend Trait
//! The [`Saa1099Backend`] trait lets a sequencer drive any chip model
//! interchangeably with the built-in [`Saa1099`].
//!
//! # Quick start
//! ```
//! use saa1099::Saa1099;
//!
//! let mut chip = Saa1099::new();
//! chip.write_register(0x00, 0xFF); // Amplitude channel 0
//! chip.write_register(0x08, 227); // Offset channel 0 (A)
//! chip.write_register(0x10, 0x03); // Octave channel 0
//! chip.write_register(0x14, 0x01); // Tone on channel 0
//! chip.write_register(0x1C, 0x01); // Sound enable
//!
//! let mut left = vec![0.0f32; 882];
//! let mut right = vec![0.0f32; 882];
//! chip.render(&mut left, &mut right);
//! ```

#![warn(missing_docs)]

pub mod backend; // Backend trait abstraction
pub mod chip; // SAA1099 PSG emulation (core)
pub mod config;
pub mod dc_filter;
pub mod envelope;
pub mod generators; // Oscillators and noise
pub mod mixer;
pub mod registers;

/// Error types for SAA1099 chip emulator operations
#[derive(thiserror::Error, Debug)]
pub enum Saa1099Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Saa1099Error {
    /// Converts a String into `Saa1099Error::Other`.
    ///
    /// Prefer [`Saa1099Error::ConfigError`] when the failure is a bad setting.
    fn from(msg: String) -> Self {
        Saa1099Error::Other(msg)
    }
}

impl From<&str> for Saa1099Error {
    fn from(msg: &str) -> Self {
        Saa1099Error::Other(msg.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Saa1099Error>;

// Public API exports
pub use backend::Saa1099Backend;
pub use chip::Saa1099;
pub use config::{ChipConfig, DEFAULT_SAMPLE_RATE, SAM_COUPE_CLOCK};
pub use envelope::{EnvelopeControl, EnvelopeShape};
pub use mixer::MAX_MIX_LEVEL;
pub use registers::{
    ChannelMask, NUM_CHANNELS, NUM_REGISTERS, Register, RegisterFile, RegisterSnapshot,
};
