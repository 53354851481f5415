//! Tick processing and song advancement.
//!
//! One tick is two phases:
//! - `advance_line` when the current line's ticks are used up: position and
//!   line overrun handling, then trackline dispatch into every channel
//! - `render_frame` on every tick: sample/ornament/effect evaluation and
//!   register composition

use log::trace;
use saa1099::{ChannelMask, Register};

use super::{PlayerMode, Transport};
use crate::effects::{ActiveEffect, EffectKind, RELEASE_SUPPRESSES_BELOW};
use crate::runtime::{ChannelState, DelayedTrigger, Runtime};
use crate::song::{SampleTick, Song, StereoVolume, Trackline, CHANNELS};
use crate::tables::{tone_word, wrap_tone, MAX_FREQUENCY_WORD};

/// Tick processing context containing all mutable state needed for a tick.
pub(crate) struct TickContext<'a> {
    pub song: &'a mut Song,
    pub runtime: &'a mut Runtime,
    pub transport: &'a mut Transport,
    pub loop_mode: bool,
}

/// Trigger part of a trackline (everything but the effect).
#[derive(Debug, Clone, Copy, Default)]
struct Trigger {
    tone: u8,
    sample: u8,
    ornament: u8,
    volume: u8,
    release: bool,
    ornament_release: bool,
}

impl From<&Trackline> for Trigger {
    fn from(row: &Trackline) -> Self {
        Self {
            tone: row.tone,
            sample: row.smp,
            ornament: row.orn,
            volume: row.volume,
            release: row.release,
            ornament_release: row.orn_release,
        }
    }
}

impl From<DelayedTrigger> for Trigger {
    fn from(d: DelayedTrigger) -> Self {
        Self {
            tone: d.tone,
            sample: d.sample,
            ornament: d.ornament,
            volume: d.volume,
            release: d.release,
            ornament_release: d.ornament_release,
        }
    }
}

/// Register values accumulated over one frame.
struct FrameRegs {
    octaves: [u8; CHANNELS / 2],
    freq_enable: ChannelMask,
    noise_enable: ChannelMask,
    noise_rate: [Option<u8>; 2],
    noise_override: [Option<u8>; 2],
    envelope: [Option<u8>; 2],
}

impl TickContext<'_> {
    /// Run one tick. Returns `false` once playback has stopped.
    pub fn step(&mut self) -> bool {
        match self.transport.mode {
            PlayerMode::Stopped => return false,
            PlayerMode::Sample => {}
            _ => {
                if self.transport.tick >= self.transport.line_ticks && !self.advance_line() {
                    self.silence();
                    self.transport.mode = PlayerMode::Stopped;
                    return false;
                }
            }
        }

        self.render_frame();
        self.transport.tick = self.transport.tick.saturating_add(1);

        let transient = matches!(self.transport.mode, PlayerMode::Line | PlayerMode::Sample);
        if transient && !self.runtime.is_audible() {
            self.transport.mode = PlayerMode::Stopped;
            return false;
        }
        true
    }

    // ------------------------------------------------------------------
    // Line phase
    // ------------------------------------------------------------------

    /// Load the next line. Returns `false` when playback ends.
    pub fn advance_line(&mut self) -> bool {
        if self.transport.mode == PlayerMode::Line {
            if !self.transport.started {
                self.transport.started = true;
                self.dispatch_line();
            }
            self.transport.tick = 0;
            self.transport.line_ticks = self.transport.speed.ticks_for_line(self.transport.line);
            return true;
        }

        if self.transport.position >= self.song.positions.len() {
            return false;
        }

        let mut next = self.transport.line + 1;
        if !self.transport.started {
            self.transport.started = true;
            next = 0;
            self.enter_position(self.transport.position, true);
        }

        if next >= self.song.positions[self.transport.position].length {
            let count = self.song.positions.len();
            match self.transport.mode {
                PlayerMode::Position if self.loop_mode => {
                    self.enter_position(self.transport.position, false)
                }
                PlayerMode::Position => return false,
                _ if self.transport.position + 1 < count => {
                    self.enter_position(self.transport.position + 1, true)
                }
                PlayerMode::Song if self.loop_mode && self.song.repeat_position < count => {
                    self.enter_position(self.song.repeat_position, false)
                }
                _ => return false,
            }
            if self.song.positions[self.transport.position].length == 0 {
                return false;
            }
            next = 0;
        }

        self.transport.line = next;
        self.dispatch_line();
        self.transport.tick = 0;
        self.transport.line_ticks = self.transport.speed.ticks_for_line(next);
        true
    }

    fn enter_position(&mut self, index: usize, sequential: bool) {
        let position = &self.song.positions[index];
        self.transport.position = index;
        self.transport.speed = position.speed;
        for (state, ch) in self.runtime.channels.iter_mut().zip(position.ch.iter()) {
            state.line = 0;
            state.pitch = ch.pitch;
        }
        if index == self.song.repeat_position {
            self.transport.repeat_reached = true;
        }

        let records = matches!(self.transport.mode, PlayerMode::Song | PlayerMode::Simulation)
            && !self.transport.diverged;
        if sequential && records && self.song.positions[index].initial_state.is_none() {
            self.song.positions[index].initial_state = Some(Box::new(self.runtime.clone()));
        }
    }

    fn dispatch_line(&mut self) {
        let position = self.transport.position;
        for channel in 0..CHANNELS {
            let line = self.runtime.channels[channel].line;
            let row = self.song.trackline(position, channel, line);
            self.dispatch(channel, &row);
        }
    }

    /// Apply one trackline to a channel.
    fn dispatch(&mut self, channel: usize, row: &Trackline) {
        let effect = if row.release && row.cmd < RELEASE_SUPPRESSES_BELOW {
            None
        } else {
            EffectKind::decode(row.cmd, row.param)
        };
        if effect.is_none() && row.cmd != 0 {
            trace!(
                "channel {channel}: inert effect {:X}{:02X}",
                row.cmd,
                row.param
            );
        }

        let state = &mut self.runtime.channels[channel];
        let line = state.line;
        state.line = match effect {
            Some(EffectKind::BreakToLine(target)) if (target as usize) < line => target as usize,
            _ => line + 1,
        };

        let previous = state.effect;
        match effect {
            Some(EffectKind::Delay(countdown)) => {
                let trigger = Trigger::from(row);
                state.delayed = Some(DelayedTrigger {
                    tone: trigger.tone,
                    sample: trigger.sample,
                    ornament: trigger.ornament,
                    volume: trigger.volume,
                    release: trigger.release,
                    ornament_release: trigger.ornament_release,
                    countdown,
                });
            }
            Some(kind @ EffectKind::Glissando { .. }) if state.playing && row.tone > 0 => {
                self.start_glissando(channel, row, kind);
                return;
            }
            _ => self.apply_trigger(channel, Trigger::from(row)),
        }

        if let Some(kind) = effect {
            self.apply_effect(channel, row, kind, previous);
        }
    }

    fn apply_trigger(&mut self, channel: usize, trigger: Trigger) {
        let state = &mut self.runtime.channels[channel];
        if trigger.volume != 0 {
            let volume = StereoVolume::from_byte(trigger.volume);
            state.attenuation = StereoVolume::new(15 - volume.left, 15 - volume.right);
        }
        if trigger.sample > 0 {
            state.sample = trigger.sample as usize;
        }
        if trigger.ornament > 0 {
            state.ornament = trigger.ornament as usize;
        }
        if trigger.tone > 0 {
            state.tone = trigger.tone;
            state.playing = true;
            state.released = false;
            state.sample_cursor = 0;
            state.ornament_cursor = 0;
            state.ornament_wait = 0;
            state.ornament_done = false;
            state.shift = 0;
            state.effect = None;
            state.delayed = None;
        }
        if trigger.release {
            if self.song.sample(state.sample).releasable {
                state.released = true;
            } else {
                self.runtime.reset_channel(channel);
                return;
            }
        }
        if trigger.ornament_release {
            state.ornament_done = true;
        }
    }

    fn start_glissando(&mut self, channel: usize, row: &Trackline, kind: EffectKind) {
        self.apply_trigger(
            channel,
            Trigger {
                tone: 0,
                ..Trigger::from(row)
            },
        );

        let state = &mut self.runtime.channels[channel];
        let pitch = state.pitch as i32;
        let from = tone_word(wrap_tone(state.tone as i32 + pitch)) as i32 + state.shift as i32;
        let to = tone_word(wrap_tone(row.tone as i32 + pitch)) as i32;
        let delta = to - from;

        if delta == 0 {
            state.tone = row.tone;
            state.shift = 0;
            state.effect = None;
            return;
        }
        let mut effect = ActiveEffect::new(row.cmd, row.param, kind);
        effect.remaining = delta as i16;
        effect.target = row.tone;
        state.effect = Some(effect);
    }

    fn apply_effect(
        &mut self,
        channel: usize,
        row: &Trackline,
        kind: EffectKind,
        previous: Option<ActiveEffect>,
    ) {
        let sample = self.song.sample(self.runtime.channels[channel].sample);
        let ornament = self.song.ornament(self.runtime.channels[channel].ornament);
        let state = &mut self.runtime.channels[channel];

        match kind {
            // Not playing, or no target tone: the trigger already ran.
            EffectKind::Glissando { .. } => {}
            EffectKind::Vibrato { .. } | EffectKind::Tremolo { .. }
                if previous.is_some_and(|p| p.same_command(row.cmd, row.param)) =>
            {
                state.effect = previous;
            }
            _ if kind.is_continuous() => {
                state.effect = Some(ActiveEffect::new(row.cmd, row.param, kind));
            }
            EffectKind::OrnamentDelay(ticks) if state.ornament != 0 && !ornament.is_empty() => {
                state.ornament_wait = ticks;
            }
            EffectKind::OrnamentOffset(offset) if (offset as usize) < ornament.end => {
                state.ornament_cursor = offset as usize;
                state.ornament_done = false;
            }
            EffectKind::SampleOffset(offset) => {
                let limit = if sample.releasable {
                    sample.tail_len()
                } else {
                    sample.end
                };
                if (offset as usize) < limit {
                    state.sample_cursor = offset as usize;
                } else {
                    trace!("channel {channel}: sample offset {offset} past sample end");
                }
            }
            EffectKind::VolumeSlide(None) => {
                state.slide = None;
                state.volume_slide = 0;
            }
            EffectKind::VolumeSlide(Some(slide)) => state.slide = Some(slide),
            EffectKind::Stereo(swap) => state.stereo_swap = swap,
            EffectKind::NoiseRate(rate) => state.noise_override = Some(rate),
            EffectKind::EnvelopeOn(control) => state.envelope = Some(control),
            EffectKind::EnvelopeOff => state.envelope = None,
            EffectKind::Speed(speed) => self.transport.speed = speed,
            // Consumed by dispatch.
            EffectKind::BreakToLine(_) | EffectKind::Delay(_) => {}
            _ => trace!(
                "channel {channel}: effect {:X}{:02X} has no target",
                row.cmd,
                row.param
            ),
        }
    }

    // ------------------------------------------------------------------
    // Frame phase
    // ------------------------------------------------------------------

    /// Evaluate every channel and write the register image.
    pub fn render_frame(&mut self) {
        self.runtime.regs.clear_changes();

        let regs = &self.runtime.regs;
        let mut frame = FrameRegs {
            octaves: [
                regs.read(Register::Octave01),
                regs.read(Register::Octave23),
                regs.read(Register::Octave45),
            ],
            freq_enable: ChannelMask::empty(),
            noise_enable: ChannelMask::empty(),
            noise_rate: [None; 2],
            noise_override: [None; 2],
            envelope: [None; 2],
        };

        for channel in (0..CHANNELS).rev() {
            self.render_channel(channel, &mut frame);
            if channel % 2 == 0 {
                let pair = channel / 2;
                self.runtime
                    .regs
                    .write(Register::octave(channel), frame.octaves[pair]);
            }
        }

        let previous = self.runtime.regs.read(Register::NoiseGenerator);
        let rates = [previous & 0x03, (previous >> 4) & 0x03];
        let rate = |t: usize| frame.noise_override[t].or(frame.noise_rate[t]).unwrap_or(rates[t]);
        let noise = rate(0) | (rate(1) << 4);

        let regs = &mut self.runtime.regs;
        regs.write(Register::FrequencyEnable, frame.freq_enable.bits());
        regs.write(Register::NoiseEnable, frame.noise_enable.bits());
        regs.write(Register::NoiseGenerator, noise);
        regs.write(Register::Envelope0, frame.envelope[0].unwrap_or(0));
        regs.write(Register::Envelope1, frame.envelope[1].unwrap_or(0));
        regs.write(Register::Control, 0x01);
    }

    fn render_channel(&mut self, channel: usize, frame: &mut FrameRegs) {
        let triplet = channel / 3;
        self.tick_delayed_trigger(channel);

        let state = &self.runtime.channels[channel];
        if state.noise_override.is_some() {
            frame.noise_override[triplet] = state.noise_override;
        }
        if state.envelope.is_some() {
            frame.envelope[triplet] = state.envelope;
        }

        let sample = self.song.sample(state.sample);
        let limit = if state.released && sample.releasable {
            sample.tail_len()
        } else {
            sample.end
        };
        if !state.playing || state.tone == 0 || state.sample_cursor >= limit {
            self.runtime.channels[channel].playing = false;
            self.runtime.regs.write(Register::amplitude(channel), 0);
            return;
        }

        let tick = sample.tick(state.sample_cursor);
        let ornament = self.song.ornament(state.ornament);
        let ornament_offset = if state.ornament_wait > 0 || state.ornament_done {
            0
        } else {
            ornament.offset(state.ornament_cursor)
        };

        let state = &mut self.runtime.channels[channel];
        let (effect, arrived) = match state.effect.as_mut() {
            Some(effect) => effect.tick(&mut state.shift),
            None => Default::default(),
        };
        if arrived {
            if let Some(done) = state.effect.take() {
                state.tone = done.target;
                state.shift = 0;
            }
        }
        if let Some(slide) = state.slide.as_mut() {
            slide.tick(&mut state.volume_slide);
        }

        // Amplitude
        let delta = (effect.attenuation as i16 + state.volume_slide as i16).clamp(-15, 15);
        let mut volume = output_volume(&tick, state.attenuation, delta);
        if state.stereo_swap {
            volume = volume.swapped();
        }
        self.runtime
            .regs
            .write(Register::amplitude(channel), volume.amplitude());

        // Frequency
        let tone = wrap_tone(
            state.tone as i32
                + state.pitch as i32
                + ornament_offset as i32
                + effect.semitones as i32,
        );
        let word = (tone_word(tone) as i32
            + state.shift as i32
            + tick.shift as i32
            + effect.frequency as i32)
            .rem_euclid(MAX_FREQUENCY_WORD as i32 + 1) as u16;
        self.runtime
            .regs
            .write(Register::frequency(channel), (word & 0xFF) as u8);
        let octave = ((word >> 8) & 0x07) as u8;
        let pair = &mut frame.octaves[channel / 2];
        *pair = if channel % 2 == 1 {
            (*pair & 0x0F) | (octave << 4)
        } else {
            (*pair & 0xF0) | octave
        };

        // Mixer
        let bit = ChannelMask::channel(channel);
        if tick.enable_freq && state.envelope.is_none() {
            frame.freq_enable.insert(bit);
        }
        if tick.enable_noise {
            frame.noise_enable.insert(bit);
            frame.noise_rate[triplet] = Some(tick.noise & 0x03);
        }

        self.advance_cursors(channel);
    }

    fn tick_delayed_trigger(&mut self, channel: usize) {
        let state = &mut self.runtime.channels[channel];
        let Some(mut pending) = state.delayed else {
            return;
        };
        if pending.countdown > 0 {
            pending.countdown -= 1;
            state.delayed = Some(pending);
            return;
        }
        state.delayed = None;
        self.apply_trigger(channel, Trigger::from(pending));
    }

    fn advance_cursors(&mut self, channel: usize) {
        let state = &mut self.runtime.channels[channel];
        let sample = self.song.sample(state.sample);
        let ornament = self.song.ornament(state.ornament);

        state.sample_cursor += 1;
        let through_tail = state.released && sample.releasable;
        if !through_tail && state.sample_cursor >= sample.end && sample.loops() {
            state.sample_cursor = sample.loop_start;
        }

        if state.ornament_wait > 0 {
            state.ornament_wait -= 1;
        } else if !state.ornament_done {
            state.ornament_cursor += 1;
            if state.ornament_cursor >= ornament.end {
                if ornament.loops() {
                    state.ornament_cursor = ornament.loop_start;
                } else {
                    state.ornament_done = true;
                }
            }
        }
    }

    /// Zero every amplitude and mixer enable.
    pub fn silence(&mut self) {
        for channel in 0..CHANNELS {
            self.runtime.regs.write(Register::amplitude(channel), 0);
        }
        self.runtime.regs.write(Register::FrequencyEnable, 0);
        self.runtime.regs.write(Register::NoiseEnable, 0);
        for state in self.runtime.channels.iter_mut() {
            *state = ChannelState {
                line: state.line,
                pitch: state.pitch,
                ..ChannelState::default()
            };
        }
    }
}

/// Sample volume minus trackline attenuation and effect delta, per side.
fn output_volume(tick: &SampleTick, attenuation: StereoVolume, delta: i16) -> StereoVolume {
    let side = |level: u8, atten: u8| (level as i16 - atten as i16 - delta).clamp(0, 15) as u8;
    StereoVolume::new(
        side(tick.volume.left, attenuation.left),
        side(tick.volume.right, attenuation.right),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{Ornament, Pattern, Position, Sample};

    fn song(rows: &[&str], length: usize) -> Song {
        let mut song = Song::new("", "");
        let looped = Sample::parse(&["FF1.+000"]).unwrap().with_loop(0);
        song.set_sample(1, looped).unwrap();
        let pat = song.add_pattern();
        song.set_pattern(pat, Pattern::parse(rows).unwrap()).unwrap();
        song.add_position(Position::new(length, 1).unwrap().with_channel(0, pat, 0));
        song
    }

    fn run(song: &mut Song, runtime: &mut Runtime, ticks: usize) -> Vec<Runtime> {
        let mut transport = Transport {
            mode: PlayerMode::Song,
            ..Transport::default()
        };
        let mut out = Vec::new();
        for _ in 0..ticks {
            let mut ctx = TickContext {
                song: &mut *song,
                runtime: &mut *runtime,
                transport: &mut transport,
                loop_mode: false,
            };
            if !ctx.step() {
                break;
            }
            out.push(runtime.clone());
        }
        out
    }

    fn amps(frames: &[Runtime]) -> Vec<u8> {
        frames.iter().map(|f| f.regs.read(Register::Amplitude0)).collect()
    }

    fn words(frames: &[Runtime]) -> Vec<u16> {
        frames.iter().map(|f| word(f, 0)).collect()
    }

    /// Four ticks with levels F, E, D, C; `end` covers the first two.
    fn fading_tail(releasable: bool) -> Sample {
        let mut sample = Sample::parse(&["FF1.+000", "EE1.+000", "DD1.+000", "CC1.+000"])
            .unwrap()
            .with_loop(0)
            .with_release(releasable);
        sample.end = 2;
        sample
    }

    fn word(rt: &Runtime, channel: usize) -> u16 {
        let octave = rt.regs.read(Register::octave(channel));
        let octave = if channel % 2 == 1 { octave >> 4 } else { octave & 0x0F };
        ((octave as u16) << 8) | rt.regs.read(Register::frequency(channel)) as u16
    }

    #[test]
    fn test_trigger_writes_tone_and_amplitude() {
        let mut song = song(&["37010000000"], 1);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 1);
        assert_eq!(word(&frames[0], 0), 0x321);
        assert_eq!(frames[0].regs.read(Register::Amplitude0), 0xFF);
        assert_eq!(frames[0].regs.read(Register::FrequencyEnable), 0x01);
        assert_eq!(frames[0].regs.read(Register::Control), 0x01);
    }

    #[test]
    fn test_volume_column_attenuates_per_side() {
        let mut song = song(&["370100F8000"], 1);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 1);
        // left 15 - 0, right 15 - 7
        assert_eq!(frames[0].regs.read(Register::Amplitude0), 0x8F);
    }

    #[test]
    fn test_release_of_plain_sample_silences() {
        let mut song = song(&["37010000000", "00100000000"], 2);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 2);
        assert_eq!(frames[1].regs.read(Register::Amplitude0), 0);
        assert!(!frames[1].channels[0].playing);
    }

    #[test]
    fn test_release_suppresses_low_effects() {
        let mut song = song(&["37010000000", "00100000111", "00000000000"], 3);
        song.samples[1].releasable = true;
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 3);
        assert!(frames[1].channels[0].released);
        assert_eq!(frames[1].channels[0].effect, None);
        assert!(frames.iter().all(|f| word(f, 0) == 0x321));
    }

    #[test]
    fn test_portamento_moves_frequency() {
        let mut song = song(&["37010000112", "00000000000", "00000000000"], 3);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 3);
        let words: Vec<u16> = frames.iter().map(|f| word(f, 0)).collect();
        assert_eq!(words, vec![0x323, 0x325, 0x327]);
    }

    #[test]
    fn test_zero_nibble_portamento_is_inert() {
        let mut song = song(&["37010000110", "00000000000"], 2);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 2);
        assert!(frames.iter().all(|f| word(f, 0) == 0x321));
    }

    #[test]
    fn test_glissando_reaches_target_exactly() {
        let mut song = song(&["37010000000", "38000000318"], 2);
        song.positions[0].speed = crate::song::Speed::Plain(6);
        song.count_all_frames();
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 12);
        assert_eq!(frames.len(), 12);
        // C-4 (0x321) to C#4 (0x33C) is 27 units, 8 per tick
        let words: Vec<u16> = frames[6..10].iter().map(|f| word(f, 0)).collect();
        assert_eq!(words, vec![0x329, 0x331, 0x339, 0x33C]);
        let last = frames.last().unwrap();
        assert_eq!(word(last, 0), 0x33C);
        assert_eq!(last.channels[0].tone, 38);
        assert_eq!(last.channels[0].shift, 0);
        assert!(last.channels[0].effect.is_none());
    }

    #[test]
    fn test_delayed_trigger_waits() {
        let mut song = song(&["37010000D02"], 1);
        song.positions[0].speed = crate::song::Speed::Plain(4);
        song.count_all_frames();
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 4);
        let amps: Vec<u8> = frames.iter().map(|f| f.regs.read(Register::Amplitude0)).collect();
        assert_eq!(amps, vec![0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_envelope_disables_tone() {
        let mut song = song(&["37010000E10", "00000000EF0"], 2);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 2);
        assert_eq!(frames[0].regs.read(Register::FrequencyEnable), 0);
        assert_eq!(frames[0].regs.read(Register::Envelope0), 0x80);
        assert_eq!(frames[1].regs.read(Register::FrequencyEnable), 0x01);
        assert_eq!(frames[1].regs.read(Register::Envelope0), 0);
    }

    #[test]
    fn test_stereo_swap() {
        let mut song = song(&["370100F0CF1"], 1);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 1);
        // left full, right attenuated to zero, then swapped
        assert_eq!(frames[0].regs.read(Register::Amplitude0), 0xF0);
    }

    #[test]
    fn test_song_end_stops() {
        let mut song = song(&["37010000000"], 1);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 5);
        assert_eq!(frames.len(), 1);
        assert_eq!(rt.regs.read(Register::Amplitude0), 0);
    }

    #[test]
    fn test_break_jumps_back_to_earlier_line() {
        let rows = ["370100FF000", "00000088000", "00000000B00", "00000000000"];
        let mut song = song(&rows, 4);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 4);
        assert_eq!(frames[2].channels[0].line, 0);
        // line 0 is read again on the fourth tick
        assert_eq!(amps(&frames), vec![0xFF, 0x88, 0x88, 0xFF]);
        assert_eq!(frames[3].channels[0].line, 1);
    }

    #[test]
    fn test_break_to_current_or_later_line_is_ignored() {
        for cmd in ["B02", "B07"] {
            let rows = [
                "370100FF000".to_string(),
                "00000000000".to_string(),
                format!("00000000{cmd}"),
                "00000088000".to_string(),
            ];
            let mut song = song(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 4);
            let mut rt = Runtime::new();
            let frames = run(&mut song, &mut rt, 4);
            assert_eq!(frames[2].channels[0].line, 3, "{cmd}");
            assert_eq!(amps(&frames), vec![0xFF, 0xFF, 0xFF, 0x88], "{cmd}");
        }
    }

    #[test]
    fn test_ornament_delay_holds_first_offset() {
        let octave = Ornament::parse(&["0", "+12"]).unwrap().with_loop(0);

        let mut plain = song(&["37011000000"], 4);
        plain.set_ornament(1, octave.clone()).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut plain, &mut rt, 4);
        assert_eq!(words(&frames), vec![0x321, 0x421, 0x321, 0x421]);

        let mut delayed = song(&["37011000602"], 4);
        delayed.set_ornament(1, octave).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut delayed, &mut rt, 4);
        assert_eq!(words(&frames), vec![0x321, 0x321, 0x321, 0x421]);
    }

    #[test]
    fn test_ornament_delay_needs_an_ornament() {
        // no ornament selected, then ornament 2 which is empty
        for row in ["37010000602", "37012000602"] {
            let mut song = song(&[row], 1);
            song.set_ornament(1, Ornament::parse(&["0", "+12"]).unwrap())
                .unwrap();
            let mut rt = Runtime::new();
            let frames = run(&mut song, &mut rt, 1);
            assert_eq!(frames[0].channels[0].ornament_wait, 0, "{row}");
        }
    }

    #[test]
    fn test_ornament_offset_moves_cursor() {
        let chord = Ornament::parse(&["0", "+12", "+7"]).unwrap().with_loop(0);

        let mut song_valid = song(&["37011000701"], 2);
        song_valid.set_ornament(1, chord.clone()).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song_valid, &mut rt, 2);
        // +12 then +7 (tone 44, octave 3 offset 192)
        assert_eq!(words(&frames), vec![0x421, 0x3C0]);

        // offset at the ornament end is ignored
        let mut song_past = song(&["37011000703"], 1);
        song_past.set_ornament(1, chord.clone()).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song_past, &mut rt, 1);
        assert_eq!(words(&frames), vec![0x321]);
        assert_eq!(frames[0].channels[0].ornament_cursor, 1);

        // the offset restarts an ornament stopped by the ornament release flag
        let mut song_held = song(&["37011100701"], 1);
        song_held.set_ornament(1, chord).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song_held, &mut rt, 1);
        assert_eq!(words(&frames), vec![0x421]);
    }

    #[test]
    fn test_ornament_and_transpose_wrap_into_tone_range() {
        let mut song = song(&["94011000701"], 2);
        song.set_ornament(1, Ornament::parse(&["0", "+1"]).unwrap().with_loop(0))
            .unwrap();
        song.positions[0].ch[0].pitch = 2;
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 2);
        assert_eq!(frames[0].channels[0].pitch, 2);
        // 94 + 2 + 1 wraps to tone 1; then 94 + 2 is the top B
        assert_eq!(words(&frames), vec![0x021, MAX_FREQUENCY_WORD]);
    }

    #[test]
    fn test_sample_offset_within_sample() {
        let mut song = song(&["37020000801"], 2);
        song.set_sample(2, fading_tail(false)).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 2);
        assert_eq!(amps(&frames), vec![0xEE, 0xFF]);
    }

    #[test]
    fn test_sample_offset_past_end_is_ignored() {
        let mut song = song(&["37020000803"], 1);
        song.set_sample(2, fading_tail(false)).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 1);
        assert_eq!(amps(&frames), vec![0xFF]);
        assert_eq!(frames[0].channels[0].sample_cursor, 1);
    }

    #[test]
    fn test_sample_offset_reaches_release_tail() {
        let rows = ["37020000000", "00100000000", "00000000803"];
        let mut song = song(&rows, 3);
        song.set_sample(2, fading_tail(true)).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 3);
        assert!(frames[1].channels[0].released);
        // the tail would continue with 0xDD; the offset skips to its last tick
        assert_eq!(amps(&frames), vec![0xFF, 0xEE, 0xCC]);
    }

    #[test]
    fn test_repeated_wobble_keeps_phase() {
        for cmd in ['4', '5'] {
            let rows = [
                format!("37010000{cmd}12"),
                format!("00000000{cmd}12"),
                format!("00000000{cmd}13"),
            ];
            let mut song = song(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 3);
            let mut rt = Runtime::new();
            let frames = run(&mut song, &mut rt, 3);
            let phases: Vec<u8> = frames
                .iter()
                .map(|f| f.channels[0].effect.map_or(0, |e| e.phase))
                .collect();
            // same parameter continues, a new parameter restarts
            assert_eq!(phases, vec![1, 2, 1], "{cmd}");
            assert_eq!(frames[2].channels[0].effect.map(|e| e.param), Some(0x13));
        }
    }

    #[test]
    fn test_noise_rate_effect_beats_sample_rate() {
        let rate_one = Sample::parse(&["FF11+000"]).unwrap().with_loop(0);

        let mut plain = song(&["37020000000"], 1);
        plain.set_sample(2, rate_one.clone()).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut plain, &mut rt, 1);
        assert_eq!(frames[0].regs.read(Register::NoiseEnable), 0x01);
        assert_eq!(frames[0].regs.read(Register::NoiseGenerator), 0x01);

        let mut forced = song(&["37020000E03"], 1);
        forced.set_sample(2, rate_one).unwrap();
        let mut rt = Runtime::new();
        let frames = run(&mut forced, &mut rt, 1);
        assert_eq!(frames[0].regs.read(Register::NoiseEnable), 0x01);
        assert_eq!(frames[0].regs.read(Register::NoiseGenerator), 0x03);
    }

    #[test]
    fn test_volume_slide_reaches_amplitude() {
        // fade out by one every tick, then cancel
        let mut song = song(&["37010000919", "00000000000", "00000000900"], 3);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 3);
        assert_eq!(amps(&frames), vec![0xEE, 0xDD, 0xFF]);
        assert_eq!(frames[2].channels[0].volume_slide, 0);
    }

    #[test]
    fn test_volume_slide_period_and_fade_in() {
        let mut song = song(&["370100CC922"], 4);
        let mut rt = Runtime::new();
        let frames = run(&mut song, &mut rt, 4);
        // attenuation 3, lifted by 2 every second tick and capped at full
        assert_eq!(amps(&frames), vec![0xCC, 0xEE, 0xEE, 0xFF]);
    }
}
