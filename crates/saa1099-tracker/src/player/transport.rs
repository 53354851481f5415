//! Transport calls and the per-interrupt audio pull.
//!
//! Failures are reported as `false` / `0`, never as errors: these calls sit
//! directly behind UI buttons and the audio callback.

use log::{debug, warn};
use saa1099::Saa1099Backend;

use super::{Player, PlayerMode, Transport};
use crate::song::{CHANNELS, MAX_ORNAMENTS, MAX_SAMPLES, MAX_TONE};

impl<B: Saa1099Backend> Player<B> {
    /// Start position or song playback.
    ///
    /// * `from_start` - begin at the first position instead of the current one
    /// * `follow` - continue through the following positions (song mode);
    ///   otherwise the position repeats (or stops, without loop mode)
    /// * `reset_line` - begin at line 0 instead of the current line
    ///
    /// Returns `false` when the song has no positions or the current position
    /// is gone or has no lines.
    pub fn play_position(&mut self, from_start: bool, follow: bool, reset_line: bool) -> bool {
        if self.song.positions.is_empty() {
            warn!("play requested on a song without positions");
            return false;
        }
        let position = if from_start { 0 } else { self.transport.position };
        let Some(length) = self.song.positions.get(position).map(|p| p.length) else {
            warn!("play requested at missing position {position}");
            return false;
        };
        if length == 0 {
            warn!("play requested at empty position {position}");
            return false;
        }
        let line = if from_start || reset_line {
            0
        } else {
            self.transport.line.min(length - 1)
        };
        let mode = if follow {
            PlayerMode::Song
        } else {
            PlayerMode::Position
        };

        let state = self.ensure_position_state(position);
        self.runtime = state;
        self.transport = Transport::start(mode, position);
        if line > 0 {
            self.fast_forward(line);
        }
        self.pending = 0.0;
        self.paused = false;

        debug!("{mode:?} playback from position {position} line {line}");
        true
    }

    /// Preview the current line until it falls silent (or is stopped).
    pub fn play_line(&mut self) -> bool {
        let Some(position) = self.song.positions.get(self.transport.position) else {
            warn!("line preview requested without a current position");
            return false;
        };
        let Some(last) = position.length.checked_sub(1) else {
            warn!("line preview requested on an empty position");
            return false;
        };
        let line = self.transport.line.min(last);

        self.runtime.reset();
        for (state, ch) in self.runtime.channels.iter_mut().zip(position.ch.iter()) {
            state.line = line;
            state.pitch = ch.pitch;
        }
        self.transport = Transport {
            line,
            speed: position.speed,
            ..Transport::start(PlayerMode::Line, self.transport.position)
        };
        self.pending = 0.0;
        self.paused = false;

        debug!("line preview at position {} line {line}", self.transport.position);
        true
    }

    /// Audition a sample on the isolated runtime.
    ///
    /// Uses `channel` (0-5) when given, otherwise the first silent channel.
    /// Returns the channel used plus one, or 0 when the sample cannot play.
    pub fn play_sample(
        &mut self,
        sample: usize,
        ornament: usize,
        tone: u8,
        channel: Option<u8>,
    ) -> u8 {
        if matches!(
            self.transport.mode,
            PlayerMode::Song | PlayerMode::Position | PlayerMode::Simulation
        ) {
            warn!("sample audition refused during {:?} playback", self.transport.mode);
            return 0;
        }
        if sample == 0 || sample >= MAX_SAMPLES || self.song.sample(sample).is_empty() {
            return 0;
        }
        if tone == 0 || tone > MAX_TONE {
            return 0;
        }

        let channel = match channel {
            Some(ch) if (ch as usize) < CHANNELS => ch as usize,
            Some(_) => return 0,
            None => match self.audition.channels.iter().position(|c| !c.is_audible()) {
                Some(ch) => ch,
                None => return 0,
            },
        };

        self.audition.reset_channel(channel);
        let state = &mut self.audition.channels[channel];
        state.tone = tone;
        state.sample = sample;
        state.ornament = if ornament < MAX_ORNAMENTS { ornament } else { 0 };
        state.playing = true;

        if self.transport.mode != PlayerMode::Sample {
            self.transport = Transport {
                line: self.transport.line,
                ..Transport::start(PlayerMode::Sample, self.transport.position)
            };
            self.pending = 0.0;
        }
        self.paused = false;

        debug!("audition sample {sample} tone {tone} on channel {channel}");
        channel as u8 + 1
    }

    /// Stop one channel (`Some`) or all playback (`None`).
    pub fn stop(&mut self, channel: Option<u8>) {
        match channel {
            Some(ch) => {
                if self.transport.mode == PlayerMode::Sample {
                    self.audition.reset_channel(ch as usize);
                } else {
                    self.runtime.reset_channel(ch as usize);
                    self.transport.diverged = true;
                }
            }
            None => {
                self.transport.mode = PlayerMode::Stopped;
                self.transport.started = false;
                self.runtime.reset();
                self.audition.reset();
                self.pending = 0.0;
                self.paused = false;
                self.push_registers(false);
                debug!("stopped");
            }
        }
    }

    /// Render `length` stereo frames at the interrupt rate.
    ///
    /// Ticks run whenever the previous tick's share of frames is used up, so
    /// calls may be any size and tick boundaries fall mid-buffer. Renders at
    /// most `min(left.len(), right.len())` frames.
    pub fn get_audio(&mut self, left: &mut [f32], right: &mut [f32], length: usize) {
        let length = length.min(left.len()).min(right.len());
        let mut done = 0;
        while done < length {
            if self.pending <= 0.0 {
                self.process_tick();
                self.pending += self.samples_per_tick;
            }
            let chunk = (self.pending.ceil() as usize).clamp(1, length - done);
            self.chip
                .render(&mut left[done..done + chunk], &mut right[done..done + chunk]);
            self.pending -= chunk as f64;
            done += chunk;
        }
    }

    /// Render interleaved stereo frames (`L, R, L, R, ...`).
    pub(crate) fn render_interleaved(&mut self, buffer: &mut [f32]) {
        let frames = buffer.len() / 2;
        let mut left = std::mem::take(&mut self.left);
        let mut right = std::mem::take(&mut self.right);
        left.resize(frames, 0.0);
        right.resize(frames, 0.0);

        self.get_audio(&mut left, &mut right, frames);
        for (i, frame) in buffer.chunks_exact_mut(2).enumerate() {
            frame[0] = left[i];
            frame[1] = right[i];
        }
        if buffer.len() % 2 == 1 {
            buffer[buffer.len() - 1] = 0.0;
        }

        self.left = left;
        self.right = right;
    }
}
