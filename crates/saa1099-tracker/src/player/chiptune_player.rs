//! ChiptunePlayer trait implementation for the tracker player.
//!
//! Exposes song playback through the unified `saa1099-common` interface so a
//! host can drive tracker songs like any other chiptune format.

use saa1099::Saa1099Backend;
use saa1099_common::{ChiptunePlayer, ChiptunePlayerBase, MetadataFields, PlaybackState};

use super::{Player, PlayerMode};
use crate::song::{Song, CHANNELS};

/// Metadata of a tracker song.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerMetadata {
    /// Song title
    pub title: String,
    /// Author/composer name
    pub author: String,
    /// Ticks of one pass through all positions
    pub total_ticks: u64,
    /// Rows in the song order
    pub positions: usize,
    /// Position song playback wraps to, when it exists
    pub repeat_position: Option<usize>,
    /// Tick at which the repeat position starts
    pub loop_tick: Option<u64>,
    /// Sequencer ticks per second
    pub interrupt_rate: u32,
}

impl TrackerMetadata {
    /// Collect metadata from a song with counted tick tables.
    pub fn from_song(song: &Song, interrupt_rate: u32) -> Self {
        let repeat_position =
            (song.repeat_position < song.positions.len()).then_some(song.repeat_position);
        Self {
            title: song.title.clone(),
            author: song.author.clone(),
            total_ticks: song.total_ticks(),
            positions: song.positions.len(),
            repeat_position,
            loop_tick: repeat_position.map(|p| song.position_start_tick(p)),
            interrupt_rate,
        }
    }
}

impl MetadataFields for TrackerMetadata {
    fn title(&self) -> &str {
        &self.title
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn format(&self) -> &str {
        "SAA"
    }

    fn frame_count(&self) -> u64 {
        self.total_ticks
    }

    fn frame_rate(&self) -> u32 {
        self.interrupt_rate
    }

    fn position_count(&self) -> usize {
        self.positions
    }

    fn repeat_position(&self) -> Option<usize> {
        self.repeat_position
    }

    fn loop_frame(&self) -> Option<u64> {
        self.loop_tick
    }
}

impl<B: Saa1099Backend> ChiptunePlayerBase for Player<B> {
    fn play(&mut self) {
        if self.paused && self.transport.mode != PlayerMode::Stopped {
            self.paused = false;
        } else {
            self.play_position(true, true, true);
        }
    }

    fn pause(&mut self) {
        if self.transport.mode != PlayerMode::Stopped {
            self.paused = true;
        }
    }

    fn stop(&mut self) {
        Player::stop(self, None);
    }

    fn state(&self) -> PlaybackState {
        if self.transport.mode == PlayerMode::Stopped {
            PlaybackState::Stopped
        } else if self.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    fn generate_samples_into(&mut self, buffer: &mut [f32]) {
        if self.state() == PlaybackState::Playing {
            self.render_interleaved(buffer);
        } else {
            buffer.fill(0.0);
        }
    }

    fn sample_rate(&self) -> u32 {
        Player::sample_rate(self)
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        Player::set_channel_mute(self, channel, mute);
    }

    fn is_channel_muted(&self, channel: usize) -> bool {
        Player::is_channel_muted(self, channel)
    }

    fn playback_position(&self) -> f32 {
        let total = self.song.total_ticks();
        if total > 0 {
            (self.elapsed_ticks() as f32 / total as f32).min(1.0)
        } else {
            0.0
        }
    }

    fn seek(&mut self, position: f32) -> bool {
        if !(0.0..=1.0).contains(&position) {
            return false;
        }
        let total = self.song.total_ticks();
        let tick = ((position as f64 * total as f64) as u64).min(total.saturating_sub(1));
        match self.song.locate_tick(tick) {
            Some((position, line)) => Player::seek(self, position, line),
            None => false,
        }
    }

    fn duration_seconds(&self) -> f32 {
        self.metadata.duration_seconds()
    }

    fn channel_count(&self) -> usize {
        CHANNELS
    }
}

impl<B: Saa1099Backend> ChiptunePlayer for Player<B> {
    type Metadata = TrackerMetadata;

    fn metadata(&self) -> &TrackerMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::song::{Pattern, Position, Sample};

    fn player() -> Player {
        let mut song = Song::new("Title", "Author");
        song.set_sample(1, Sample::parse(&["FF1.+000"]).unwrap().with_loop(0))
            .unwrap();
        let pat = song.add_pattern();
        song.set_pattern(pat, Pattern::parse(&["37010000000"]).unwrap())
            .unwrap();
        song.add_position(Position::new(8, 6).unwrap().with_channel(0, pat, 0));
        song.add_position(Position::new(8, 6).unwrap().with_channel(0, pat, 5));
        song.repeat_position = 1;
        Player::new(song, PlayerConfig::default()).unwrap()
    }

    #[test]
    fn test_metadata() {
        let player = player();
        let meta = player.metadata();
        assert_eq!(meta.title(), "Title");
        assert_eq!(meta.format(), "SAA");
        assert_eq!(meta.frame_count(), 96);
        assert_eq!(meta.position_count(), 2);
        assert_eq!(meta.repeat_position(), Some(1));
        assert_eq!(meta.loop_frame(), Some(48));
        assert_eq!(meta.duration_seconds(), 1.92);
        assert_eq!(meta.loop_seconds(), Some(0.96));
    }

    #[test]
    fn test_metadata_follows_repeat_edits() {
        let mut player = player();
        player.set_repeat_position(5);
        let meta = player.metadata();
        assert_eq!(meta.repeat_position(), None);
        assert_eq!(meta.loop_frame(), None);
        assert_eq!(meta.loop_seconds(), None);

        player.set_repeat_position(0);
        assert_eq!(player.metadata().loop_seconds(), Some(1.92));
    }

    #[test]
    fn test_play_pause_stop() {
        let mut player = player();
        assert_eq!(player.state(), PlaybackState::Stopped);

        let mut buffer = vec![1.0; 64];
        player.generate_samples_into(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));

        ChiptunePlayerBase::play(&mut player);
        assert!(player.is_playing());
        player.generate_samples_into(&mut buffer);
        assert_eq!(player.line(), 0);

        ChiptunePlayerBase::pause(&mut player);
        assert_eq!(player.state(), PlaybackState::Paused);
        buffer.fill(1.0);
        player.generate_samples_into(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));

        ChiptunePlayerBase::play(&mut player);
        assert_eq!(player.state(), PlaybackState::Playing);

        ChiptunePlayerBase::stop(&mut player);
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_seek_by_fraction() {
        let mut player = player();
        ChiptunePlayerBase::play(&mut player);
        assert!(ChiptunePlayerBase::seek(&mut player, 0.5));
        assert_eq!(player.position(), 1);
        assert!(!ChiptunePlayerBase::seek(&mut player, 1.5));
        assert!((player.playback_position() - 0.5).abs() < 1e-6);

        // the next tick loads line 0 of the second position
        let mut buffer = vec![0.0; 2];
        player.generate_samples_into(&mut buffer);
        assert_eq!((player.position(), player.line()), (1, 0));
        assert_eq!(player.runtime().channels[0].tone, 37);
        assert_eq!(player.runtime().channels[0].pitch, 5);
    }

    #[test]
    fn test_trait_object() {
        let mut boxed: Box<dyn ChiptunePlayerBase> = Box::new(player());
        assert_eq!(boxed.channel_count(), 6);
        assert_eq!(boxed.sample_rate(), 44_100);
        boxed.play();
        let out = boxed.generate_samples(882);
        assert_eq!(out.len(), 1764);
        assert!(out.iter().any(|&s| s != 0.0));
    }
}
