//! DC offset removal filter
//!
//! The SAA1099 output is unipolar: a silent channel sits at zero and a
//! sounding one swings between zero and its amplitude. Subtracting a running
//! average centres each side around zero.

use crate::mixer::MAX_MIX_LEVEL;

/// History buffer size (2048 samples = ~46ms at 44.1kHz)
const HISTORY_SIZE_BITS: usize = 11;
const HISTORY_SIZE: usize = 1 << HISTORY_SIZE_BITS;

/// Running-average DC blocker for one side of the mix.
///
/// Mixed levels never exceed [`MAX_MIX_LEVEL`] (180), so the history fits in bytes.
#[derive(Clone)]
pub struct DcFilter {
    history: Box<[u8; HISTORY_SIZE]>,
    position: usize,
    running_sum: u32,
}

impl DcFilter {
    /// Create a new DC filter
    pub fn new() -> Self {
        Self {
            history: Box::new([0; HISTORY_SIZE]),
            position: 0,
            running_sum: 0,
        }
    }

    /// Feed one mixed level and return the centred sample in -1.0..=1.0.
    #[inline]
    pub fn process(&mut self, level: u32) -> f32 {
        let level = level.min(MAX_MIX_LEVEL) as u8;
        self.running_sum -= self.history[self.position] as u32;
        self.running_sum += level as u32;
        self.history[self.position] = level;
        self.position = (self.position + 1) & (HISTORY_SIZE - 1);

        let average = self.running_sum as f32 / HISTORY_SIZE as f32;
        (level as f32 - average) / MAX_MIX_LEVEL as f32
    }

    /// Reset the filter state
    pub fn reset(&mut self) {
        self.history.fill(0);
        self.position = 0;
        self.running_sum = 0;
    }
}

impl Default for DcFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DcFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcFilter")
            .field("position", &self.position)
            .field("running_sum", &self.running_sum)
            .finish_non_exhaustive()
    }
}
