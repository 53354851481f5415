//! Constant lookup tables.
//!
//! - Tone table: semitone index to SAA1099 octave/offset frequency word
//! - Vibrato table: quantised sine, 16 depth rows of 64 phases

use crate::song::MAX_TONE;

/// Frequency offsets of C..A# within an octave (B uses the next octave).
pub const TONE_OFFSETS: [u8; 11] = [33, 60, 85, 109, 132, 153, 173, 192, 210, 227, 243];

/// Offset of B, played one octave up.
const B_OFFSET: u8 = 5;

/// Highest 11-bit frequency word.
pub const MAX_FREQUENCY_WORD: u16 = 0x7FF;

/// Frequency word `(octave << 8) | offset` of a tone (1..=96).
///
/// Tone 0 is silence and maps to 0. The last B has no octave above it and
/// saturates at [`MAX_FREQUENCY_WORD`].
pub fn tone_word(tone: u8) -> u16 {
    if tone == 0 || tone > MAX_TONE {
        return 0;
    }
    let n = (tone - 1) as u16;
    let octave = n / 12;
    match TONE_OFFSETS.get((n % 12) as usize) {
        Some(&offset) => (octave << 8) | offset as u16,
        None if octave < 7 => ((octave + 1) << 8) | B_OFFSET as u16,
        None => MAX_FREQUENCY_WORD,
    }
}

/// Fold any semitone value into the tone domain 1..=96.
#[inline]
pub fn wrap_tone(tone: i32) -> u8 {
    ((tone - 1).rem_euclid(MAX_TONE as i32) + 1) as u8
}

/// Waveform phases per depth row.
pub const VIBRATO_PHASES: usize = 64;

/// Vibrato/tremolo waveform, indexed `depth * 64 + phase`.
#[rustfmt::skip]
pub static VIBRATO_TABLE: [i8; 1024] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 0, 0, 0, 0, 0,
    0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 0, 0,
    0, 0, 0, -1, -1, -1, -1, -1, -1, -2, -2, -2, -2, -2, -2, -2,
    -2, -2, -2, -2, -2, -2, -2, -2, -1, -1, -1, -1, -1, -1, 0, 0,
    0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3,
    3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 1, 1, 1, 1, 0,
    0, 0, -1, -1, -1, -1, -2, -2, -2, -2, -2, -3, -3, -3, -3, -3,
    -3, -3, -3, -3, -3, -3, -2, -2, -2, -2, -2, -1, -1, -1, -1, 0,
    0, 0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 2, 2, 2, 1, 1, 0,
    0, 0, -1, -1, -2, -2, -2, -3, -3, -3, -3, -4, -4, -4, -4, -4,
    -4, -4, -4, -4, -4, -4, -3, -3, -3, -3, -2, -2, -2, -1, -1, 0,
    0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5,
    5, 5, 5, 5, 5, 4, 4, 4, 4, 3, 3, 2, 2, 1, 1, 0,
    0, 0, -1, -1, -2, -2, -3, -3, -4, -4, -4, -4, -5, -5, -5, -5,
    -5, -5, -5, -5, -5, -4, -4, -4, -4, -3, -3, -2, -2, -1, -1, 0,
    0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 5, 6, 6, 6, 6,
    6, 6, 6, 6, 6, 5, 5, 5, 4, 4, 3, 3, 2, 2, 1, 1,
    0, -1, -1, -2, -2, -3, -3, -4, -4, -5, -5, -5, -6, -6, -6, -6,
    -6, -6, -6, -6, -6, -5, -5, -5, -4, -4, -3, -3, -2, -2, -1, -1,
    0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6, 6, 6, 7, 7, 7,
    7, 7, 7, 7, 6, 6, 6, 5, 5, 4, 4, 3, 3, 2, 1, 1,
    0, -1, -1, -2, -3, -3, -4, -4, -5, -5, -6, -6, -6, -7, -7, -7,
    -7, -7, -7, -7, -6, -6, -6, -5, -5, -4, -4, -3, -3, -2, -1, -1,
    0, 1, 2, 2, 3, 4, 4, 5, 6, 6, 7, 7, 7, 8, 8, 8,
    8, 8, 8, 8, 7, 7, 7, 6, 6, 5, 4, 4, 3, 2, 2, 1,
    0, -1, -2, -2, -3, -4, -4, -5, -6, -6, -7, -7, -7, -8, -8, -8,
    -8, -8, -8, -8, -7, -7, -7, -6, -6, -5, -4, -4, -3, -2, -2, -1,
    0, 1, 2, 3, 3, 4, 5, 6, 6, 7, 7, 8, 8, 9, 9, 9,
    9, 9, 9, 9, 8, 8, 7, 7, 6, 6, 5, 4, 3, 3, 2, 1,
    0, -1, -2, -3, -3, -4, -5, -6, -6, -7, -7, -8, -8, -9, -9, -9,
    -9, -9, -9, -9, -8, -8, -7, -7, -6, -6, -5, -4, -3, -3, -2, -1,
    0, 1, 2, 3, 4, 5, 6, 6, 7, 8, 8, 9, 9, 10, 10, 10,
    10, 10, 10, 10, 9, 9, 8, 8, 7, 6, 6, 5, 4, 3, 2, 1,
    0, -1, -2, -3, -4, -5, -6, -6, -7, -8, -8, -9, -9, -10, -10, -10,
    -10, -10, -10, -10, -9, -9, -8, -8, -7, -6, -6, -5, -4, -3, -2, -1,
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 10, 10, 11, 11, 11,
    11, 11, 11, 11, 10, 10, 9, 9, 8, 7, 6, 5, 4, 3, 2, 1,
    0, -1, -2, -3, -4, -5, -6, -7, -8, -9, -9, -10, -10, -11, -11, -11,
    -11, -11, -11, -11, -10, -10, -9, -9, -8, -7, -6, -5, -4, -3, -2, -1,
    0, 1, 2, 3, 5, 6, 7, 8, 8, 9, 10, 11, 11, 11, 12, 12,
    12, 12, 12, 11, 11, 11, 10, 9, 8, 8, 7, 6, 5, 3, 2, 1,
    0, -1, -2, -3, -5, -6, -7, -8, -8, -9, -10, -11, -11, -11, -12, -12,
    -12, -12, -12, -11, -11, -11, -10, -9, -8, -8, -7, -6, -5, -3, -2, -1,
    0, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 11, 12, 12, 13, 13,
    13, 13, 13, 12, 12, 11, 11, 10, 9, 8, 7, 6, 5, 4, 3, 1,
    0, -1, -3, -4, -5, -6, -7, -8, -9, -10, -11, -11, -12, -12, -13, -13,
    -13, -13, -13, -12, -12, -11, -11, -10, -9, -8, -7, -6, -5, -4, -3, -1,
    0, 1, 3, 4, 5, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14,
    14, 14, 14, 13, 13, 12, 12, 11, 10, 9, 8, 7, 5, 4, 3, 1,
    0, -1, -3, -4, -5, -7, -8, -9, -10, -11, -12, -12, -13, -13, -14, -14,
    -14, -14, -14, -13, -13, -12, -12, -11, -10, -9, -8, -7, -5, -4, -3, -1,
    0, 1, 3, 4, 6, 7, 8, 10, 11, 12, 12, 13, 14, 14, 15, 15,
    15, 15, 15, 14, 14, 13, 12, 12, 11, 10, 8, 7, 6, 4, 3, 1,
    0, -1, -3, -4, -6, -7, -8, -10, -11, -12, -12, -13, -14, -14, -15, -15,
    -15, -15, -15, -14, -14, -13, -12, -12, -11, -10, -8, -7, -6, -4, -3, -1,
];

/// Waveform value for a depth row (0-15) and phase (wraps at 64).
#[inline]
pub fn vibrato(depth: u8, phase: u8) -> i8 {
    VIBRATO_TABLE[(depth as usize & 0x0F) * VIBRATO_PHASES + (phase as usize % VIBRATO_PHASES)]
}
