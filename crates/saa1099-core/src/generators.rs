//! Sound generators for the SAA1099
//!
//! - Frequency oscillators (6 channels) driven by a precomputed octave/offset table
//! - Noise generators (one per channel triplet, 17-bit LFSR)
//!
//! Every generator is advanced once per host sample. Rates are stored with
//! 7 fractional bits and compared against `sample_rate << 7`, so no floating
//! point is involved on the hot path.

/// Fractional bits of every rate accumulator.
pub const RATE_FRACTION_BITS: u32 = 7;

/// Number of octaves selectable per channel.
pub const NUM_OCTAVES: usize = 8;

/// Galois feedback mask for a 17-bit maximal-length LFSR (x^17 + x^14 + 1).
const LFSR_TAPS: u32 = 0x12000;

/// Power-on seeds of the two noise generators.
pub const NOISE_SEEDS: [u32; 2] = [0x1_1111, 0x0_2222];

/// Half-cycle rates for every octave/offset pair.
///
/// `rate = 2 · (clock / 512) · 2^octave / (511 − offset)` half-cycles per
/// second, scaled by `2^7`.
#[derive(Clone)]
pub struct FrequencyTable {
    rates: Box<[[u32; 256]; NUM_OCTAVES]>,
}

impl FrequencyTable {
    /// Build the table for a chip clock in Hz.
    pub fn new(clock: u32) -> Self {
        let mut rates = Box::new([[0u32; 256]; NUM_OCTAVES]);
        for (octave, row) in rates.iter_mut().enumerate() {
            for (offset, rate) in row.iter_mut().enumerate() {
                // (2 · clock / 512) << 7 == clock / 2
                let numerator = (clock as u64) << octave;
                let denominator = 2 * (511 - offset as u64);
                *rate = ((numerator + denominator / 2) / denominator) as u32;
            }
        }
        Self { rates }
    }

    /// Scaled half-cycle rate of an octave/offset pair.
    #[inline]
    pub fn rate(&self, octave: u8, offset: u8) -> u32 {
        self.rates[(octave & 7) as usize][offset as usize]
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrequencyTable")
            .field("lowest", &self.rates[0][0])
            .field("highest", &self.rates[NUM_OCTAVES - 1][255])
            .finish()
    }
}

/// Frequency oscillator for a single channel.
///
/// Octave and offset writes are buffered and only take effect when the
/// current half-cycle ends, as on the real chip.
#[derive(Clone, Debug, Default)]
pub struct Oscillator {
    /// Phase accumulator
    counter: u32,
    /// Active scaled rate
    rate: u32,
    octave: u8,
    offset: u8,
    pending_octave: u8,
    pending_offset: u8,
    pending: bool,
    /// Square wave output
    level: bool,
}

impl Oscillator {
    /// Create an oscillator at octave 0, offset 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a new frequency offset.
    #[inline]
    pub fn set_offset(&mut self, offset: u8) {
        self.pending_offset = offset;
        self.pending = true;
    }

    /// Buffer a new octave (0-7).
    #[inline]
    pub fn set_octave(&mut self, octave: u8) {
        self.pending_octave = octave & 7;
        self.pending = true;
    }

    /// Current octave/offset pair as an 11-bit frequency word.
    #[inline]
    pub fn frequency_word(&self) -> u16 {
        ((self.octave as u16) << 8) | self.offset as u16
    }

    /// Current output level.
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }

    #[inline]
    fn latch(&mut self, table: &FrequencyTable) {
        if self.pending {
            self.octave = self.pending_octave;
            self.offset = self.pending_offset;
            self.rate = table.rate(self.octave, self.offset);
            self.pending = false;
        }
    }

    /// Advance by one host sample and return the number of half-cycle flips.
    ///
    /// While `sync` is held the oscillator stays low with a cleared phase.
    #[inline]
    pub fn tick(&mut self, table: &FrequencyTable, threshold: u32, sync: bool) -> u32 {
        if sync {
            self.latch(table);
            self.counter = 0;
            self.level = false;
            return 0;
        }
        if self.rate == 0 {
            // First tick after power-on: nothing has ever been latched.
            self.pending = true;
            self.latch(table);
        }

        self.counter += self.rate;
        let mut flips = 0;
        while self.counter >= threshold {
            self.counter -= threshold;
            self.level = !self.level;
            flips += 1;
            self.latch(table);
        }
        flips
    }

    /// Reset phase and frequency.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Noise generator shared by a channel triplet.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    seed: u32,
    lfsr: u32,
    counter: u32,
    /// Clock select (0-2 fixed rates, 3 synced to an oscillator)
    clock_select: u8,
    level: bool,
}

impl NoiseGenerator {
    /// Create a generator with a fixed non-zero seed.
    pub fn new(seed: u32) -> Self {
        let seed = (seed & 0x1_FFFF).max(1);
        Self {
            seed,
            lfsr: seed,
            counter: 0,
            clock_select: 0,
            level: false,
        }
    }

    /// Select the clock source from the two register bits.
    #[inline]
    pub fn set_clock(&mut self, select: u8) {
        self.clock_select = select & 3;
    }

    /// Whether the generator follows its linked oscillator.
    #[inline]
    pub fn is_synced(&self) -> bool {
        self.clock_select == 3
    }

    /// Current output bit.
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }

    /// Shift the LFSR once.
    #[inline]
    pub fn step(&mut self) {
        let lsb = self.lfsr & 1;
        self.lfsr >>= 1;
        if lsb != 0 {
            self.lfsr ^= LFSR_TAPS;
        }
        self.level = lsb != 0;
    }

    /// Advance by one host sample using the fixed-rate clocks.
    ///
    /// `rates` holds the scaled rates of clock selects 0, 1 and 2.
    #[inline]
    pub fn tick(&mut self, rates: &[u32; 3], threshold: u32) {
        if self.is_synced() {
            return;
        }
        self.counter += rates[self.clock_select as usize];
        while self.counter >= threshold {
            self.counter -= threshold;
            self.step();
        }
    }

    /// Clock from the linked oscillator (only honoured in synced mode).
    #[inline]
    pub fn trigger(&mut self, flips: u32) {
        if self.is_synced() {
            for _ in 0..flips {
                self.step();
            }
        }
    }

    /// Reset to the power-on seed.
    pub fn reset(&mut self) {
        self.lfsr = self.seed;
        self.counter = 0;
        self.clock_select = 0;
        self.level = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: u32 = 8_000_000;
    const THRESHOLD: u32 = 44_100 << RATE_FRACTION_BITS;

    #[test]
    fn test_frequency_table_matches_formula() {
        let table = FrequencyTable::new(CLOCK);
        // A-4 on the SAM Coupé: octave 3, offset 227 -> ~440 Hz
        let half_cycles = table.rate(3, 227) as f64 / 128.0;
        let hz = half_cycles / 2.0;
        assert!((hz - 440.1).abs() < 0.5, "got {hz}");
        // Higher offset is always a higher pitch within an octave
        for octave in 0..8 {
            for offset in 1..=255u8 {
                assert!(table.rate(octave, offset) > table.rate(octave, offset - 1));
            }
        }
    }

    #[test]
    fn test_oscillator_latches_on_half_cycle() {
        let table = FrequencyTable::new(CLOCK);
        let mut osc = Oscillator::new();
        osc.set_octave(7);
        osc.set_offset(255);
        osc.tick(&table, THRESHOLD, false);
        assert_eq!(osc.frequency_word(), 0x7FF);

        osc.set_octave(0);
        assert_eq!(osc.frequency_word(), 0x7FF, "octave must stay buffered");
        let mut flips = 0;
        while flips == 0 {
            flips = osc.tick(&table, THRESHOLD, false);
        }
        assert_eq!(osc.frequency_word(), 0x0FF);
    }

    #[test]
    fn test_oscillator_sync_holds_low() {
        let table = FrequencyTable::new(CLOCK);
        let mut osc = Oscillator::new();
        osc.set_octave(7);
        for _ in 0..100 {
            assert_eq!(osc.tick(&table, THRESHOLD, true), 0);
            assert!(!osc.level());
        }
    }

    #[test]
    fn test_noise_lfsr_is_maximal_length() {
        let mut noise = NoiseGenerator::new(NOISE_SEEDS[0]);
        let start = noise.lfsr;
        let mut period = 0u32;
        loop {
            noise.step();
            period += 1;
            if noise.lfsr == start {
                break;
            }
            assert!(period < (1 << 17), "LFSR did not return to its seed");
        }
        assert_eq!(period, (1 << 17) - 1);
    }

    #[test]
    fn test_noise_synced_ignores_fixed_clock() {
        let mut noise = NoiseGenerator::new(NOISE_SEEDS[1]);
        noise.set_clock(3);
        let before = noise.lfsr;
        noise.tick(&[u32::MAX / 4; 3], THRESHOLD);
        assert_eq!(noise.lfsr, before);
        noise.trigger(2);
        assert_ne!(noise.lfsr, before);
    }
}
