//! Compact text rows for samples, ornaments and patterns.
//!
//! | container | layout | example |
//! |-----------|--------|---------|
//! | sample tick | `LRtN±SSS` | `F810-01A` |
//! | ornament tick | signed decimal | `+12` |
//! | trackline | `TTrSOoVVCPP` | `37010000F10` |

use nom::branch::alt;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{anychar, char, digit1, one_of};
use nom::combinator::{all_consuming, map, map_opt, opt, value};
use nom::sequence::{pair, tuple};
use nom::IResult;

use super::{SampleTick, StereoVolume, Trackline, MAX_SAMPLES, MAX_TONE};
use crate::error::{Result, TrackerError};

/// Largest magnitude of a sample tick frequency shift.
pub const MAX_SHIFT: i16 = 0x3FF;

fn nibble(input: &str) -> IResult<&str, u8> {
    map_opt(anychar, |c: char| c.to_digit(16).map(|d| d as u8))(input)
}

/// Sample index digit `0-9`, `A-V`.
fn base32_digit(input: &str) -> IResult<&str, u8> {
    map_opt(anychar, |c: char| c.to_digit(32).map(|d| d as u8))(input)
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map(pair(nibble, nibble), |(hi, lo)| (hi << 4) | lo)(input)
}

fn flag(input: &str) -> IResult<&str, bool> {
    alt((value(false, char('0')), value(true, char('1'))))(input)
}

fn noise(input: &str) -> IResult<&str, Option<u8>> {
    alt((
        value(None, char('.')),
        map(one_of("0123"), |c: char| Some(c as u8 - b'0')),
    ))(input)
}

fn shift(input: &str) -> IResult<&str, i16> {
    map(
        pair(one_of("+-"), tuple((nibble, nibble, nibble))),
        |(sign, (a, b, c))| {
            let magnitude = ((a as i16) << 8) | ((b as i16) << 4) | c as i16;
            if sign == '-' {
                -magnitude
            } else {
                magnitude
            }
        },
    )(input)
}

fn sample_row(input: &str) -> IResult<&str, SampleTick> {
    map(
        tuple((nibble, nibble, flag, noise, shift)),
        |(left, right, enable_freq, noise, shift)| {
            SampleTick::new(StereoVolume::new(left, right), enable_freq, noise, shift)
        },
    )(input)
}

fn ornament_row(input: &str) -> IResult<&str, i8> {
    map_opt(
        pair(opt(one_of("+-")), digit1),
        |(sign, digits): (Option<char>, &str)| {
            let magnitude = digits.parse::<i16>().ok()?;
            let value = if sign == Some('-') { -magnitude } else { magnitude };
            i8::try_from(value).ok()
        },
    )(input)
}

fn tone(input: &str) -> IResult<&str, u8> {
    map_opt(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u8>().ok().filter(|&t| t <= MAX_TONE)
    })(input)
}

fn trackline_row(input: &str) -> IResult<&str, Trackline> {
    map(
        tuple((
            tone,
            flag,
            base32_digit,
            nibble,
            flag,
            hex_byte,
            nibble,
            hex_byte,
        )),
        |(tone, release, smp, orn, orn_release, volume, cmd, param)| Trackline {
            tone,
            release,
            smp,
            orn,
            orn_release,
            volume,
            cmd,
            param,
        },
    )(input)
}

fn run<'a, O>(
    kind: &'static str,
    row: usize,
    input: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O> {
    all_consuming(parser)(input.trim())
        .map(|(_, out)| out)
        .map_err(|e| TrackerError::parse(kind, row, format!("'{input}': {e}")))
}

/// Parse one `LRtN±SSS` sample row.
pub fn parse_sample_tick(row: usize, input: &str) -> Result<SampleTick> {
    let tick = run("sample", row, input, sample_row)?;
    if tick.shift.abs() > MAX_SHIFT {
        return Err(TrackerError::parse(
            "sample",
            row,
            format!("shift {} exceeds ±{MAX_SHIFT}", tick.shift),
        ));
    }
    Ok(tick)
}

/// Format one sample row.
pub fn format_sample_tick(tick: &SampleTick) -> String {
    let noise = if tick.enable_noise {
        char::from(b'0' + (tick.noise & 3))
    } else {
        '.'
    };
    let sign = if tick.shift < 0 { '-' } else { '+' };
    format!(
        "{:X}{:X}{}{}{}{:03X}",
        tick.volume.left & 0x0F,
        tick.volume.right & 0x0F,
        u8::from(tick.enable_freq),
        noise,
        sign,
        tick.shift.unsigned_abs().min(MAX_SHIFT as u16)
    )
}

/// Parse one signed decimal ornament row.
pub fn parse_ornament_tick(row: usize, input: &str) -> Result<i8> {
    run("ornament", row, input, ornament_row)
}

/// Format one ornament row.
pub fn format_ornament_tick(offset: i8) -> String {
    if offset == 0 {
        "0".to_string()
    } else {
        format!("{offset:+}")
    }
}

/// Parse one `TTrSOoVVCPP` trackline.
pub fn parse_trackline(row: usize, input: &str) -> Result<Trackline> {
    run("pattern", row, input, trackline_row)
}

/// Format one trackline.
pub fn format_trackline(line: &Trackline) -> String {
    let smp = char::from_digit(line.smp as u32 % MAX_SAMPLES as u32, 32)
        .map_or('0', |c| c.to_ascii_uppercase());
    format!(
        "{:02}{}{}{:X}{}{:02X}{:X}{:02X}",
        line.tone.min(MAX_TONE),
        u8::from(line.release),
        smp,
        line.orn & 0x0F,
        u8::from(line.orn_release),
        line.volume,
        line.cmd & 0x0F,
        line.param
    )
}
