//! Chip configuration

use serde::{Deserialize, Serialize};

use crate::{Result, Saa1099Error};

/// SAM Coupé master clock (8 MHz)
pub const SAM_COUPE_CLOCK: u32 = 8_000_000;

/// Default audio sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Clock and output settings of an emulated chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipConfig {
    /// Chip clock in Hz
    pub clock: u32,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Centre the unipolar output with a running-average DC blocker
    pub dc_filter: bool,
}

impl ChipConfig {
    /// SAM Coupé clock at a given sample rate.
    pub fn sam_coupe(sample_rate: u32) -> Self {
        Self {
            clock: SAM_COUPE_CLOCK,
            sample_rate,
            dc_filter: true,
        }
    }

    /// Raw unipolar output, as the chip pins would deliver it.
    pub fn raw(self) -> Self {
        Self {
            dc_filter: false,
            ..self
        }
    }

    /// Reject settings the rate accumulators cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 || self.sample_rate > (u32::MAX >> 8) {
            return Err(Saa1099Error::ConfigError(format!(
                "sample rate {} Hz out of range",
                self.sample_rate
            )));
        }
        if self.clock < 512 || self.clock > 32_000_000 {
            return Err(Saa1099Error::ConfigError(format!(
                "chip clock {} Hz out of range",
                self.clock
            )));
        }
        Ok(())
    }
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self::sam_coupe(DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sam_coupe() {
        let cfg = ChipConfig::default();
        assert_eq!(cfg.clock, 8_000_000);
        assert_eq!(cfg.sample_rate, 44_100);
        assert!(cfg.dc_filter);
        assert!(cfg.validate().is_ok());
        assert!(!cfg.raw().dc_filter);
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let cfg = ChipConfig::sam_coupe(0);
        assert!(matches!(
            cfg.validate(),
            Err(Saa1099Error::ConfigError(_))
        ));
    }
}
