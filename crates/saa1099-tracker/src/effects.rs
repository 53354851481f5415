//! Effect decoding and per-channel effect state.
//!
//! A trackline carries one effect id (`0x1..=0xF`) and a parameter byte.
//! [`EffectKind::decode`] turns the pair into a closed enum, returning `None`
//! for parameter combinations that are inert. Checks that depend on channel
//! state (ornament length, current line) are made by the sequencer when the
//! effect is latched.
//!
//! Continuous effects (portamento, glissando, vibrato, tremolo, false chord)
//! stay latched on the channel as an [`ActiveEffect`] and run every tick.
//! Everything else is applied once when the line is read.

use serde::{Deserialize, Serialize};

use crate::song::Speed;
use crate::tables::{vibrato, VIBRATO_PHASES};

/// Portamento up.
pub const CMD_PORTAMENTO_UP: u8 = 0x1;
/// Portamento down.
pub const CMD_PORTAMENTO_DOWN: u8 = 0x2;
/// Glissando to the line's tone.
pub const CMD_GLISSANDO: u8 = 0x3;
/// Vibrato.
pub const CMD_VIBRATO: u8 = 0x4;
/// Tremolo.
pub const CMD_TREMOLO: u8 = 0x5;
/// Ornament delay.
pub const CMD_ORNAMENT_DELAY: u8 = 0x6;
/// Ornament offset.
pub const CMD_ORNAMENT_OFFSET: u8 = 0x7;
/// Sample offset.
pub const CMD_SAMPLE_OFFSET: u8 = 0x8;
/// Volume slide.
pub const CMD_VOLUME_SLIDE: u8 = 0x9;
/// Break and loop from line.
pub const CMD_BREAK: u8 = 0xB;
/// False chord / stereo swap.
pub const CMD_SPECIAL: u8 = 0xC;
/// Delayed trigger.
pub const CMD_DELAY: u8 = 0xD;
/// Noise rate / hardware envelope.
pub const CMD_NOISE_ENVELOPE: u8 = 0xE;
/// Global speed.
pub const CMD_SPEED: u8 = 0xF;

/// Ids below this are dropped on a line carrying the release flag.
pub const RELEASE_SUPPRESSES_BELOW: u8 = 0xA;

/// Largest accumulated fine shift of a portamento.
pub const MAX_SHIFT_ACCUMULATOR: i16 = 0x7FF;

/// A decoded effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Raise pitch by `step` every `period` ticks
    PortamentoUp {
        /// Ticks between steps
        period: u8,
        /// Frequency units per step
        step: u8,
    },
    /// Lower pitch by `step` every `period` ticks
    PortamentoDown {
        /// Ticks between steps
        period: u8,
        /// Frequency units per step
        step: u8,
    },
    /// Slide towards the line's tone by `step` every `period` ticks
    Glissando {
        /// Ticks between steps
        period: u8,
        /// Frequency units per step
        step: u8,
    },
    /// Frequency wobble
    Vibrato {
        /// Phase advance per tick
        rate: u8,
        /// Table depth (1-15)
        depth: u8,
    },
    /// Volume wobble
    Tremolo {
        /// Phase advance per tick
        rate: u8,
        /// Table depth (1-15)
        depth: u8,
    },
    /// Hold the ornament for a number of ticks
    OrnamentDelay(u8),
    /// Jump the ornament cursor
    OrnamentOffset(u8),
    /// Jump the sample cursor
    SampleOffset(u8),
    /// Start (`Some`) or cancel (`None`) a volume slide
    VolumeSlide(Option<VolumeSlide>),
    /// Continue this channel's pattern from an earlier line
    BreakToLine(u8),
    /// Alternate the tone between two semitone offsets
    FalseChord {
        /// Semitones added on even ticks
        first: u8,
        /// Semitones added on odd ticks
        second: u8,
    },
    /// Normal (`false`) or swapped (`true`) stereo sides
    Stereo(bool),
    /// Defer the line's trigger by a number of ticks
    Delay(u8),
    /// Override the triplet's noise rate (0-3)
    NoiseRate(u8),
    /// Hardware envelope on with the given control byte
    EnvelopeOn(u8),
    /// Hardware envelope off
    EnvelopeOff,
    /// Global speed change
    Speed(Speed),
}

#[inline]
const fn nibbles(param: u8) -> (u8, u8) {
    (param >> 4, param & 0x0F)
}

impl EffectKind {
    /// Decode an effect id and parameter; `None` when the pair is inert.
    pub fn decode(cmd: u8, param: u8) -> Option<Self> {
        let (x, y) = nibbles(param);
        let both = x != 0 && y != 0;
        let kind = match cmd {
            CMD_PORTAMENTO_UP if both => EffectKind::PortamentoUp { period: x, step: y },
            CMD_PORTAMENTO_DOWN if both => EffectKind::PortamentoDown { period: x, step: y },
            CMD_GLISSANDO if both => EffectKind::Glissando { period: x, step: y },
            CMD_VIBRATO if both => EffectKind::Vibrato { rate: x, depth: y },
            CMD_TREMOLO if both => EffectKind::Tremolo { rate: x, depth: y },
            CMD_ORNAMENT_DELAY if param > 0 => EffectKind::OrnamentDelay(param),
            CMD_ORNAMENT_OFFSET => EffectKind::OrnamentOffset(param),
            CMD_SAMPLE_OFFSET => EffectKind::SampleOffset(param),
            CMD_VOLUME_SLIDE if param == 0 => EffectKind::VolumeSlide(None),
            CMD_VOLUME_SLIDE => EffectKind::VolumeSlide(Some(VolumeSlide::decode(param)?)),
            CMD_BREAK => EffectKind::BreakToLine(param),
            CMD_SPECIAL => match (x, y) {
                (0xF, 0) => EffectKind::Stereo(false),
                (0xF, 1) => EffectKind::Stereo(true),
                (0xF, _) | (0, 0) => return None,
                _ => EffectKind::FalseChord {
                    first: x,
                    second: y,
                },
            },
            CMD_DELAY if param > 0 => EffectKind::Delay(param),
            CMD_NOISE_ENVELOPE => match (x, y) {
                (0, 0..=3) => EffectKind::NoiseRate(y),
                (1..=8, 0..=3) => EffectKind::EnvelopeOn(envelope_control(x - 1, y)),
                (0xF, 0) => EffectKind::EnvelopeOff,
                _ => return None,
            },
            CMD_SPEED => EffectKind::Speed(decode_speed(param)?),
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the effect stays latched and runs every tick.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            EffectKind::PortamentoUp { .. }
                | EffectKind::PortamentoDown { .. }
                | EffectKind::Glissando { .. }
                | EffectKind::Vibrato { .. }
                | EffectKind::Tremolo { .. }
                | EffectKind::FalseChord { .. }
        )
    }
}

/// Speed effect parameter. Unlike a position's speed byte, equal swing
/// nibbles are rejected instead of collapsing to a plain speed.
fn decode_speed(param: u8) -> Option<Speed> {
    let (even, odd) = nibbles(param);
    if param >= 0x20 && even == odd {
        return None;
    }
    Speed::from_byte(param)
}

/// Envelope control byte for shape `0..=7` and the two option bits of `EXY`:
/// bit 0 inverts the right side, bit 1 selects 3-bit resolution.
fn envelope_control(shape: u8, options: u8) -> u8 {
    0x80 | (shape << 1) | (options & 0x01) | ((options & 0x02) << 3)
}

/// Volume slide settings decoded from `9XY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSlide {
    /// Ticks between steps
    pub period: u8,
    /// Attenuation change per step (1-7)
    pub magnitude: u8,
    /// Fade out (attenuation grows) when set, fade in otherwise
    pub fade_out: bool,
    /// Ticks until the next step
    pub timer: u8,
}

impl VolumeSlide {
    fn decode(param: u8) -> Option<Self> {
        let (period, y) = nibbles(param);
        let magnitude = y & 0x07;
        if period == 0 || magnitude == 0 {
            return None;
        }
        Some(Self {
            period,
            magnitude,
            fade_out: y & 0x08 != 0,
            timer: period,
        })
    }

    /// Count one tick and step `accumulator` when the period elapses.
    pub fn tick(&mut self, accumulator: &mut i8) {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return;
        }
        self.timer = self.period;
        let step = if self.fade_out {
            self.magnitude as i8
        } else {
            -(self.magnitude as i8)
        };
        *accumulator = accumulator.saturating_add(step).clamp(-15, 15);
    }
}

/// Per-tick contribution of the latched effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectOutput {
    /// Transient frequency offset (vibrato)
    pub frequency: i16,
    /// Transient semitone offset (false chord)
    pub semitones: i8,
    /// Transient attenuation (tremolo)
    pub attenuation: i8,
}

/// A continuous effect latched on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect id as written in the pattern
    pub cmd: u8,
    /// Parameter as written in the pattern
    pub param: u8,
    /// Decoded effect
    pub kind: EffectKind,
    /// Ticks until the next period step
    pub timer: u8,
    /// Waveform phase or chord phase
    pub phase: u8,
    /// Glissando: frequency distance still to travel
    pub remaining: i16,
    /// Glissando: tone reached on arrival
    pub target: u8,
}

impl ActiveEffect {
    /// Latch a decoded continuous effect.
    pub fn new(cmd: u8, param: u8, kind: EffectKind) -> Self {
        let timer = match kind {
            EffectKind::PortamentoUp { period, .. }
            | EffectKind::PortamentoDown { period, .. }
            | EffectKind::Glissando { period, .. } => period,
            _ => 0,
        };
        Self {
            cmd,
            param,
            kind,
            timer,
            phase: 0,
            remaining: 0,
            target: 0,
        }
    }

    /// Whether a line's effect repeats this one exactly.
    pub fn same_command(&self, cmd: u8, param: u8) -> bool {
        self.cmd == cmd && self.param == param
    }

    fn period_elapsed(&mut self, period: u8) -> bool {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return false;
        }
        self.timer = period;
        true
    }

    /// Run one tick.
    ///
    /// `shift` is the channel's persistent fine-shift accumulator. Returns the
    /// transient output and whether a glissando arrived this tick (the caller
    /// then moves the channel onto [`target`](Self::target) and clears the
    /// effect).
    pub fn tick(&mut self, shift: &mut i16) -> (EffectOutput, bool) {
        let mut out = EffectOutput::default();
        match self.kind {
            EffectKind::PortamentoUp { period, step } => {
                if self.period_elapsed(period) {
                    *shift = (*shift + step as i16).min(MAX_SHIFT_ACCUMULATOR);
                }
            }
            EffectKind::PortamentoDown { period, step } => {
                if self.period_elapsed(period) {
                    *shift = (*shift - step as i16).max(-MAX_SHIFT_ACCUMULATOR);
                }
            }
            EffectKind::Glissando { period, step } => {
                if self.remaining == 0 {
                    return (out, true);
                }
                if self.period_elapsed(period) {
                    let delta = self.remaining.signum() * (step as i16).min(self.remaining.abs());
                    *shift += delta;
                    self.remaining -= delta;
                    if self.remaining == 0 {
                        return (out, true);
                    }
                }
            }
            EffectKind::Vibrato { rate, depth } => {
                self.phase = (self.phase + rate) & (VIBRATO_PHASES as u8 - 1);
                out.frequency = vibrato(depth, self.phase) as i16;
            }
            EffectKind::Tremolo { rate, depth } => {
                self.phase = (self.phase + rate) & (VIBRATO_PHASES as u8 - 1);
                out.attenuation = vibrato(depth, self.phase).clamp(-15, 15);
            }
            EffectKind::FalseChord { first, second } => {
                let offset = if self.phase == 0 { first } else { second };
                out.semitones = offset as i8;
                self.phase ^= 1;
            }
            _ => {}
        }
        (out, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_nibble_is_inert() {
        for cmd in [CMD_PORTAMENTO_UP, CMD_PORTAMENTO_DOWN, CMD_GLISSANDO, CMD_VIBRATO, CMD_TREMOLO] {
            for param in [0x00, 0x05, 0x50] {
                assert_eq!(EffectKind::decode(cmd, param), None, "{cmd:X}{param:02X}");
            }
            assert!(EffectKind::decode(cmd, 0x11).is_some());
        }
    }

    #[test]
    fn test_special_command_ranges() {
        assert_eq!(
            EffectKind::decode(CMD_SPECIAL, 0x47),
            Some(EffectKind::FalseChord { first: 4, second: 7 })
        );
        assert_eq!(EffectKind::decode(CMD_SPECIAL, 0xF0), Some(EffectKind::Stereo(false)));
        assert_eq!(EffectKind::decode(CMD_SPECIAL, 0xF1), Some(EffectKind::Stereo(true)));
        assert_eq!(EffectKind::decode(CMD_SPECIAL, 0xF2), None);
        assert_eq!(EffectKind::decode(CMD_SPECIAL, 0x00), None);
    }

    #[test]
    fn test_noise_envelope_ranges() {
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x02), Some(EffectKind::NoiseRate(2)));
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x04), None);
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x10), Some(EffectKind::EnvelopeOn(0x80)));
        // shape 4, inverted right side, 3-bit resolution
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x53), Some(EffectKind::EnvelopeOn(0x99)));
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x84), None);
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0x90), None);
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0xF0), Some(EffectKind::EnvelopeOff));
        assert_eq!(EffectKind::decode(CMD_NOISE_ENVELOPE, 0xF1), None);
    }

    #[test]
    fn test_speed_effect_validity() {
        assert_eq!(EffectKind::decode(CMD_SPEED, 0x00), None);
        assert_eq!(EffectKind::decode(CMD_SPEED, 0x50), None);
        assert_eq!(EffectKind::decode(CMD_SPEED, 0x55), None);
        assert_eq!(EffectKind::decode(CMD_SPEED, 0x10), Some(EffectKind::Speed(Speed::Plain(16))));
        assert_eq!(
            EffectKind::decode(CMD_SPEED, 0x64),
            Some(EffectKind::Speed(Speed::Swing { even: 6, odd: 4 }))
        );
    }

    #[test]
    fn test_reserved_and_empty_ids() {
        assert_eq!(EffectKind::decode(0x0, 0x12), None);
        assert_eq!(EffectKind::decode(0xA, 0x12), None);
        assert_eq!(EffectKind::decode(CMD_DELAY, 0), None);
        assert_eq!(EffectKind::decode(CMD_ORNAMENT_DELAY, 0), None);
    }

    #[test]
    fn test_volume_slide_decoding() {
        assert_eq!(EffectKind::decode(CMD_VOLUME_SLIDE, 0x00), Some(EffectKind::VolumeSlide(None)));
        assert_eq!(EffectKind::decode(CMD_VOLUME_SLIDE, 0x08), None);
        assert_eq!(EffectKind::decode(CMD_VOLUME_SLIDE, 0x30), None);
        let Some(EffectKind::VolumeSlide(Some(slide))) = EffectKind::decode(CMD_VOLUME_SLIDE, 0x2A) else {
            panic!("slide expected");
        };
        assert_eq!((slide.period, slide.magnitude, slide.fade_out), (2, 2, true));
    }

    #[test]
    fn test_volume_slide_clamps() {
        let mut slide = VolumeSlide::decode(0x1F).unwrap();
        let mut acc = 0i8;
        for _ in 0..5 {
            slide.tick(&mut acc);
        }
        assert_eq!(acc, 15);

        let mut fade_in = VolumeSlide::decode(0x23).unwrap();
        let mut acc = 0i8;
        for _ in 0..4 {
            fade_in.tick(&mut acc);
        }
        assert_eq!(acc, -6);
    }

    #[test]
    fn test_portamento_period() {
        let kind = EffectKind::decode(CMD_PORTAMENTO_UP, 0x32).unwrap();
        let mut effect = ActiveEffect::new(CMD_PORTAMENTO_UP, 0x32, kind);
        let mut shift = 0;
        let shifts: Vec<i16> = (0..6)
            .map(|_| {
                effect.tick(&mut shift);
                shift
            })
            .collect();
        assert_eq!(shifts, vec![0, 0, 2, 2, 2, 4]);
    }

    #[test]
    fn test_glissando_snaps_on_arrival() {
        let kind = EffectKind::decode(CMD_GLISSANDO, 0x14).unwrap();
        let mut effect = ActiveEffect::new(CMD_GLISSANDO, 0x14, kind);
        effect.remaining = -10;
        let mut shift = 0;
        let mut arrived = Vec::new();
        for _ in 0..3 {
            arrived.push(effect.tick(&mut shift).1);
        }
        assert_eq!(shift, -10);
        assert_eq!(arrived, vec![false, false, true]);
    }

    #[test]
    fn test_chord_alternates() {
        let kind = EffectKind::decode(CMD_SPECIAL, 0x37).unwrap();
        let mut effect = ActiveEffect::new(CMD_SPECIAL, 0x37, kind);
        let mut shift = 0;
        let offsets: Vec<i8> = (0..4).map(|_| effect.tick(&mut shift).0.semitones).collect();
        assert_eq!(offsets, vec![3, 7, 3, 7]);
    }

    #[test]
    fn test_vibrato_walks_table() {
        let kind = EffectKind::decode(CMD_VIBRATO, 0x8F).unwrap();
        let mut effect = ActiveEffect::new(CMD_VIBRATO, 0x8F, kind);
        let mut shift = 0;
        for _ in 0..8 {
            let (out, _) = effect.tick(&mut shift);
            assert_eq!(out.frequency, vibrato(15, effect.phase) as i16);
        }
        assert_eq!(effect.phase, 0);
        assert_eq!(shift, 0);
    }
}
