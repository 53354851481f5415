//! Player configuration.

use saa1099::ChipConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// PAL interrupt rate (50 Hz)
pub const PAL_INTERRUPT_RATE: u32 = 50;

/// NTSC interrupt rate (60 Hz)
pub const NTSC_INTERRUPT_RATE: u32 = 60;

/// Configuration of a tracker player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Emulated chip clocks and output filtering
    pub chip: ChipConfig,

    /// Sequencer ticks per second
    /// One tick renders `sample_rate / interrupt_rate` frames
    pub interrupt_rate: u32,

    /// Song mode wraps to the repeat position instead of stopping
    pub loop_mode: bool,
}

impl PlayerConfig {
    /// 50 Hz interrupts at the given sample rate.
    pub fn pal(sample_rate: u32) -> Self {
        Self {
            chip: ChipConfig::sam_coupe(sample_rate),
            interrupt_rate: PAL_INTERRUPT_RATE,
            loop_mode: true,
        }
    }

    /// 60 Hz interrupts at the given sample rate.
    pub fn ntsc(sample_rate: u32) -> Self {
        Self {
            interrupt_rate: NTSC_INTERRUPT_RATE,
            ..Self::pal(sample_rate)
        }
    }

    /// Change the output sample rate (builder style).
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.chip.sample_rate = sample_rate;
        self
    }

    /// Change song looping (builder style).
    pub fn with_loop_mode(mut self, loop_mode: bool) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Output frames per sequencer tick.
    pub fn samples_per_tick(&self) -> f64 {
        self.chip.sample_rate as f64 / self.interrupt_rate.max(1) as f64
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> Result<()> {
        if self.interrupt_rate == 0 || self.interrupt_rate > self.chip.sample_rate {
            return Err(TrackerError::Config(format!(
                "interrupt rate {} Hz out of range",
                self.interrupt_rate
            )));
        }
        self.chip.validate()?;
        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::pal(saa1099::DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.interrupt_rate, 50);
        assert!(cfg.loop_mode);
        assert_eq!(cfg.samples_per_tick(), 882.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_ntsc_uneven_tick() {
        let cfg = PlayerConfig::ntsc(44_100);
        assert_eq!(cfg.samples_per_tick(), 735.0);
        let odd = cfg.with_sample_rate(48_000);
        assert_eq!(odd.samples_per_tick(), 800.0);
    }

    #[test]
    fn test_rejects_zero_interrupt_rate() {
        let cfg = PlayerConfig {
            interrupt_rate: 0,
            ..PlayerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_chip_errors_propagate() {
        let cfg = PlayerConfig::pal(0);
        assert!(cfg.validate().is_err());
    }
}
