//! SAA1099 PSG emulation
//!
//! Free-running model of the Philips SAA1099: all generators advance once per
//! host sample, so a render call may start or stop anywhere and the next one
//! continues seamlessly.

use crate::backend::Saa1099Backend;
use crate::config::ChipConfig;
use crate::dc_filter::DcFilter;
use crate::envelope::EnvelopeGenerator;
use crate::generators::{
    FrequencyTable, NOISE_SEEDS, NoiseGenerator, Oscillator, RATE_FRACTION_BITS,
};
use crate::mixer::{ChannelInput, MAX_MIX_LEVEL, Mixer};
use crate::registers::{ChannelMask, NUM_CHANNELS, Register, RegisterFile, RegisterSnapshot};
use crate::Result;

/// Register 0x1C bit 0
const CONTROL_SOUND_ENABLE: u8 = 0x01;
/// Register 0x1C bit 1
const CONTROL_SYNC: u8 = 0x02;

/// Oscillator that clocks each noise generator in synced mode.
const NOISE_SYNC_SOURCE: [usize; 2] = [0, 3];
/// Oscillator that clocks each envelope generator internally.
const ENVELOPE_CLOCK_SOURCE: [usize; 2] = [1, 4];
/// Channel modulated by each envelope generator.
const ENVELOPE_CHANNEL: [usize; 2] = [2, 5];

/// SAA1099 Programmable Sound Generator emulator
///
/// # Example
///
/// ```
/// use saa1099::Saa1099;
///
/// let mut chip = Saa1099::new();
/// chip.write_register(0x00, 0xFF); // Amplitude channel 0
/// chip.write_register(0x08, 227); // Offset channel 0
/// chip.write_register(0x10, 0x03); // Octave channel 0
/// chip.write_register(0x14, 0x01); // Tone on channel 0
/// chip.write_register(0x1C, 0x01); // Sound enable
///
/// let (left, right) = chip.clock();
/// assert!(left.abs() <= 1.0 && right.abs() <= 1.0);
/// ```
#[derive(Clone)]
pub struct Saa1099 {
    config: ChipConfig,
    /// `sample_rate << 7`, the accumulator overflow point
    threshold: u32,
    table: FrequencyTable,
    /// Scaled rates of noise clock selects 0-2
    noise_rates: [u32; 3],

    regs: RegisterFile,
    address: u8,

    oscillators: [Oscillator; NUM_CHANNELS],
    noise: [NoiseGenerator; 2],
    envelopes: [EnvelopeGenerator; 2],

    mixer: Mixer,
    dc_filters: [DcFilter; 2],
}

impl Saa1099 {
    /// Create a chip with the SAM Coupé clock at 44.1 kHz
    pub fn new() -> Self {
        Self::build(ChipConfig::default())
    }

    /// Create a chip with custom clock frequencies
    ///
    /// Out-of-range values are clamped; use [`from_config`](Self::from_config)
    /// to have them rejected instead.
    pub fn with_clocks(clock: u32, sample_rate: u32) -> Self {
        Self::build(ChipConfig {
            clock: clock.clamp(512, 32_000_000),
            sample_rate: sample_rate.clamp(1, u32::MAX >> 8),
            ..ChipConfig::default()
        })
    }

    /// Create a chip from a validated configuration.
    pub fn from_config(config: &ChipConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(*config))
    }

    fn build(config: ChipConfig) -> Self {
        let clock = config.clock;
        let mut chip = Self {
            config,
            threshold: config.sample_rate << RATE_FRACTION_BITS,
            table: FrequencyTable::new(clock),
            // (clock / (256 << n)) << 7
            noise_rates: [clock / 2, clock / 4, clock / 8],
            regs: RegisterFile::new(),
            address: 0,
            oscillators: Default::default(),
            noise: [
                NoiseGenerator::new(NOISE_SEEDS[0]),
                NoiseGenerator::new(NOISE_SEEDS[1]),
            ],
            envelopes: Default::default(),
            mixer: Mixer::new(),
            dc_filters: [DcFilter::new(), DcFilter::new()],
        };
        chip.reset();
        chip
    }

    /// Reset the chip to its power-on state (mute flags are kept)
    pub fn reset(&mut self) {
        self.regs.clear();
        self.address = 0;
        for osc in &mut self.oscillators {
            osc.reset();
        }
        for noise in &mut self.noise {
            noise.reset();
        }
        for env in &mut self.envelopes {
            env.reset();
        }
        self.mixer.reset();
        for filter in &mut self.dc_filters {
            filter.reset();
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    /// Enable or disable the output DC blocker.
    pub fn set_dc_filter(&mut self, enabled: bool) {
        self.config.dc_filter = enabled;
    }

    /// Latch a register address (control port write).
    ///
    /// Envelope generators in external-clock mode step on every write that
    /// selects their control register.
    pub fn write_address(&mut self, addr: u8) {
        self.address = addr & 0x1F;
        match Register::from_addr(self.address) {
            Some(Register::Envelope0) => self.envelopes[0].clock_external(),
            Some(Register::Envelope1) => self.envelopes[1].clock_external(),
            _ => {}
        }
    }

    /// Write to the register selected by the last [`write_address`](Self::write_address).
    pub fn write_data(&mut self, value: u8) {
        self.write_register(self.address, value);
    }

    /// Write a register; addresses without a function are ignored.
    pub fn write_register(&mut self, addr: u8, value: u8) {
        if let Some(reg) = Register::from_addr(addr) {
            self.apply_register(reg, value);
        }
    }

    /// Read back a register (0 for addresses without a function).
    pub fn read_register(&self, addr: u8) -> u8 {
        Register::from_addr(addr).map_or(0, |reg| self.regs.read(reg))
    }

    fn apply_register(&mut self, reg: Register, value: u8) {
        let value = match reg {
            Register::Octave01 | Register::Octave23 | Register::Octave45 => value & 0x77,
            Register::FrequencyEnable | Register::NoiseEnable => {
                ChannelMask::from_bits_truncate(value).bits()
            }
            Register::NoiseGenerator => value & 0x33,
            Register::Envelope0 | Register::Envelope1 => value & 0xBF,
            Register::Control => value & 0x03,
            _ => value,
        };
        self.regs.write(reg, value);

        match reg {
            Register::Frequency0
            | Register::Frequency1
            | Register::Frequency2
            | Register::Frequency3
            | Register::Frequency4
            | Register::Frequency5 => {
                let channel = (reg.addr() - Register::Frequency0.addr()) as usize;
                self.oscillators[channel].set_offset(value);
            }
            Register::Octave01 | Register::Octave23 | Register::Octave45 => {
                let channel = ((reg.addr() - Register::Octave01.addr()) * 2) as usize;
                self.oscillators[channel].set_octave(value & 0x07);
                self.oscillators[channel + 1].set_octave(value >> 4);
            }
            Register::NoiseGenerator => {
                self.noise[0].set_clock(value & 0x03);
                self.noise[1].set_clock(value >> 4);
            }
            Register::Envelope0 => self.envelopes[0].write_control(value),
            Register::Envelope1 => self.envelopes[1].write_control(value),
            _ => {}
        }
    }

    /// Apply a full register image and the mute flags.
    ///
    /// Every register is written in address order, so octave and offset of a
    /// channel land in the same buffered update.
    pub fn set_all_regs(&mut self, snapshot: &RegisterSnapshot) {
        for (reg, value) in snapshot.regs.iter() {
            if self.regs.read(reg) != value {
                self.apply_register(reg, value);
            }
        }
        for (channel, &mute) in snapshot.mute.iter().enumerate() {
            self.mixer.set_mute(channel, mute);
        }
    }

    /// Capture the full register image and the mute flags.
    pub fn get_all_regs(&self) -> RegisterSnapshot {
        let mut regs = self.regs.clone();
        regs.take_changes();
        RegisterSnapshot {
            regs,
            mute: std::array::from_fn(|ch| self.mixer.is_muted(ch)),
        }
    }

    /// Current 11-bit frequency word of a channel's oscillator.
    pub fn frequency_word(&self, channel: usize) -> u16 {
        self.oscillators[channel % NUM_CHANNELS].frequency_word()
    }

    /// Advance every generator by one host sample and mix one stereo frame.
    pub fn clock(&mut self) -> (f32, f32) {
        let control = self.regs.read(Register::Control);
        let sync = control & CONTROL_SYNC != 0;

        let mut flips = [0u32; NUM_CHANNELS];
        for (osc, flip) in self.oscillators.iter_mut().zip(flips.iter_mut()) {
            *flip = osc.tick(&self.table, self.threshold, sync);
        }
        for (gen, noise) in self.noise.iter_mut().enumerate() {
            noise.trigger(flips[NOISE_SYNC_SOURCE[gen]]);
            noise.tick(&self.noise_rates, self.threshold);
        }
        for (gen, env) in self.envelopes.iter_mut().enumerate() {
            env.clock_internal(flips[ENVELOPE_CLOCK_SOURCE[gen]]);
        }

        let tone_enable = ChannelMask::from_bits_truncate(self.regs.read(Register::FrequencyEnable));
        let noise_enable = ChannelMask::from_bits_truncate(self.regs.read(Register::NoiseEnable));
        let mut left = 0u32;
        let mut right = 0u32;
        for channel in 0..NUM_CHANNELS {
            let triplet = channel / 3;
            let envelope = &self.envelopes[triplet];
            let input = ChannelInput {
                amplitude: self.regs.read(Register::amplitude(channel)),
                tone: self.oscillators[channel].level(),
                noise: self.noise[triplet].level(),
                tone_enabled: tone_enable.contains(ChannelMask::channel(channel)),
                noise_enabled: noise_enable.contains(ChannelMask::channel(channel)),
                envelope: (ENVELOPE_CHANNEL[triplet] == channel && envelope.is_enabled())
                    .then(|| envelope.output()),
            };
            let (l, r) = self.mixer.mix_channel(channel, &input);
            left += l;
            right += r;
        }

        if control & CONTROL_SOUND_ENABLE == 0 {
            left = 0;
            right = 0;
        }

        if self.config.dc_filter {
            (
                self.dc_filters[0].process(left),
                self.dc_filters[1].process(right),
            )
        } else {
            (
                left as f32 / MAX_MIX_LEVEL as f32,
                right as f32 / MAX_MIX_LEVEL as f32,
            )
        }
    }

    /// Render `min(left.len(), right.len())` stereo frames.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.clock();
        }
    }

    /// Last per-channel `(left, right)` output levels (0.0..=1.0)
    pub fn channel_outputs(&self) -> [(f32, f32); NUM_CHANNELS] {
        self.mixer.channel_outputs()
    }

    /// Mute or unmute a channel (0-5)
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.mixer.set_mute(channel, mute);
    }

    /// Check if a channel is muted
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        self.mixer.is_muted(channel)
    }
}

impl Default for Saa1099 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Saa1099 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saa1099")
            .field("config", &self.config)
            .field("regs", &self.regs)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Saa1099Backend trait implementation
// =============================================================================

impl Saa1099Backend for Saa1099 {
    fn new() -> Self {
        Saa1099::new()
    }

    fn with_clocks(clock: u32, sample_rate: u32) -> Self {
        Saa1099::with_clocks(clock, sample_rate)
    }

    fn reset(&mut self) {
        Saa1099::reset(self)
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        Saa1099::write_register(self, addr, value)
    }

    fn read_register(&self, addr: u8) -> u8 {
        Saa1099::read_register(self, addr)
    }

    fn set_all_regs(&mut self, snapshot: &RegisterSnapshot) {
        Saa1099::set_all_regs(self, snapshot)
    }

    fn get_all_regs(&self) -> RegisterSnapshot {
        Saa1099::get_all_regs(self)
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        Saa1099::render(self, left, right)
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        Saa1099::set_channel_mute(self, channel, mute)
    }

    fn is_channel_muted(&self, channel: usize) -> bool {
        Saa1099::is_channel_muted(self, channel)
    }

    fn channel_outputs(&self) -> [(f32, f32); NUM_CHANNELS] {
        Saa1099::channel_outputs(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
