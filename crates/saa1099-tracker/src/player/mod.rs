//! SAA1099 tracker song player.
//!
//! This is the main player that manages song-level playback:
//! - Transport (position, line, sample audition, stop)
//! - Tick management at the configured interrupt rate
//! - Register hand-off to the chip backend
//! - Silent simulation for seeking and batch rendering
//!
//! # Module Organization
//!
//! - [`tick`] - Line dispatch and frame rendering
//! - [`transport`] - Transport calls and the per-interrupt audio pull
//! - [`simulation`] - Scoped simulation, seeking, whole-song traces
//! - [`chiptune_player`] - ChiptunePlayer trait implementation
//!
//! # Example
//!
//! ```
//! use saa1099_tracker::{Player, PlayerConfig, Position, Sample, Song, Pattern};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut song = Song::new("demo", "me");
//! song.set_sample(1, Sample::parse(&["FF1.+000"])?.with_loop(0))?;
//! let pat = song.add_pattern();
//! song.set_pattern(pat, Pattern::parse(&["37010000000"])?)?;
//! song.add_position(Position::new(4, 6)?.with_channel(0, pat, 0));
//!
//! let mut player = Player::new(song, PlayerConfig::default())?;
//! assert!(player.play_position(true, true, true));
//!
//! let mut left = vec![0.0; 882];
//! let mut right = vec![0.0; 882];
//! player.get_audio(&mut left, &mut right, 882);
//! # Ok(())
//! # }
//! ```

mod chiptune_player;
mod simulation;
mod tick;
mod transport;

pub use chiptune_player::TrackerMetadata;
pub use simulation::SimulationGuard;

use saa1099::{RegisterSnapshot, Saa1099, Saa1099Backend};

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::song::{Song, Speed, CHANNELS};

use tick::TickContext;

/// What the sequencer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerMode {
    /// Idle
    #[default]
    Stopped,
    /// Previewing the current line
    Line,
    /// Looping (or playing once) the current position
    Position,
    /// Playing through the positions
    Song,
    /// Auditioning a sample on the isolated runtime
    Sample,
    /// Silent fast-forward
    Simulation,
}

/// Sequencer position and timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Transport {
    pub mode: PlayerMode,
    pub position: usize,
    /// Line currently playing
    pub line: usize,
    pub speed: Speed,
    /// Ticks elapsed in the current line
    pub tick: u8,
    /// Tick count of the current line
    pub line_ticks: u8,
    /// First line loaded
    pub started: bool,
    /// The repeat position was entered since the flag was last taken
    pub repeat_reached: bool,
    /// A channel was reset from outside the sequencer; entry states taken
    /// from this runtime would not match straight playback
    pub diverged: bool,
}

impl Transport {
    fn start(mode: PlayerMode, position: usize) -> Self {
        Self {
            mode,
            position,
            ..Self::default()
        }
    }

    fn take_repeat_event(&mut self) -> bool {
        std::mem::take(&mut self.repeat_reached)
    }
}

/// Tracker song player.
///
/// Owns the song, the chip backend and two runtimes: one for song playback
/// and an isolated one for sample audition.
pub struct Player<B: Saa1099Backend = Saa1099> {
    pub(crate) song: Song,
    chip: B,
    config: PlayerConfig,
    runtime: Runtime,
    audition: Runtime,
    transport: Transport,
    mute: [bool; CHANNELS],
    samples_per_tick: f64,
    /// Frames left in the current tick
    pending: f64,
    paused: bool,
    metadata: TrackerMetadata,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Player<Saa1099> {
    /// Create a player with the built-in chip emulator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(song: Song, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        let chip = Saa1099::from_config(&config.chip)?;
        Self::with_backend(song, chip, config)
    }
}

impl<B: Saa1099Backend> Player<B> {
    /// Create a player driving a custom backend.
    ///
    /// The backend's sample rate takes precedence over `config.chip`.
    pub fn with_backend(mut song: Song, chip: B, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        song.count_all_frames();
        let metadata = TrackerMetadata::from_song(&song, config.interrupt_rate);
        let samples_per_tick = chip.sample_rate() as f64 / config.interrupt_rate as f64;

        Ok(Self {
            song,
            chip,
            config,
            runtime: Runtime::new(),
            audition: Runtime::new(),
            transport: Transport::default(),
            mute: [false; CHANNELS],
            samples_per_tick,
            pending: 0.0,
            paused: false,
            metadata,
            left: Vec::new(),
            right: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Song access
    // ------------------------------------------------------------------

    /// The song being played.
    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Edit the song between ticks.
    ///
    /// Stored position entry states are dropped and tick tables recounted.
    pub fn edit_song<R>(&mut self, edit: impl FnOnce(&mut Song) -> R) -> R {
        let result = edit(&mut self.song);
        self.song.invalidate_position_states(0);
        self.song.count_all_frames();
        self.metadata = TrackerMetadata::from_song(&self.song, self.config.interrupt_rate);
        result
    }

    /// Position song playback wraps to.
    pub fn repeat_position(&self) -> usize {
        self.song.repeat_position
    }

    /// Change the repeat position.
    pub fn set_repeat_position(&mut self, position: usize) {
        self.edit_song(|song| song.repeat_position = position);
    }

    // ------------------------------------------------------------------
    // Transport state
    // ------------------------------------------------------------------

    /// Current mode.
    pub fn mode(&self) -> PlayerMode {
        self.transport.mode
    }

    /// Current position index.
    pub fn position(&self) -> usize {
        self.transport.position
    }

    /// Line currently playing.
    pub fn line(&self) -> usize {
        self.transport.line
    }

    /// Current speed.
    pub fn speed(&self) -> Speed {
        self.transport.speed
    }

    /// Ticks elapsed in the current line.
    pub fn tick(&self) -> u8 {
        self.transport.tick
    }

    /// Whether song playback wraps to the repeat position.
    pub fn loop_mode(&self) -> bool {
        self.config.loop_mode
    }

    /// Enable or disable song looping.
    pub fn set_loop_mode(&mut self, loop_mode: bool) {
        self.config.loop_mode = loop_mode;
    }

    /// Song ticks elapsed before the current tick.
    pub fn elapsed_ticks(&self) -> u64 {
        let Some(position) = self.song.positions.get(self.transport.position) else {
            return 0;
        };
        if !self.transport.started {
            return self.song.position_start_tick(self.transport.position);
        }
        let line_start = position.frames.get(self.transport.line).copied().unwrap_or(0);
        self.song.position_start_tick(self.transport.position)
            + line_start as u64
            + self.transport.tick as u64
    }

    // ------------------------------------------------------------------
    // Chip and runtime access
    // ------------------------------------------------------------------

    /// Player configuration.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.chip.sample_rate()
    }

    /// Output frames per tick.
    pub fn samples_per_tick(&self) -> f64 {
        self.samples_per_tick
    }

    /// Runtime of the current mode (the audition runtime while auditioning).
    pub fn runtime(&self) -> &Runtime {
        if self.transport.mode == PlayerMode::Sample {
            &self.audition
        } else {
            &self.runtime
        }
    }

    /// The chip backend.
    pub fn chip(&self) -> &B {
        &self.chip
    }

    /// Mutable access to the chip backend.
    pub fn chip_mut(&mut self) -> &mut B {
        &mut self.chip
    }

    /// Mute or unmute a channel (0-5).
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        if let Some(flag) = self.mute.get_mut(channel) {
            *flag = mute;
            self.chip.set_channel_mute(channel, mute);
        }
    }

    /// Check whether a channel is muted.
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        self.mute.get(channel).copied().unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Tick plumbing
    // ------------------------------------------------------------------

    fn tick_context(&mut self) -> TickContext<'_> {
        let runtime = if self.transport.mode == PlayerMode::Sample {
            &mut self.audition
        } else {
            &mut self.runtime
        };
        TickContext {
            song: &mut self.song,
            runtime,
            transport: &mut self.transport,
            loop_mode: self.config.loop_mode,
        }
    }

    /// Process one tick and hand the registers to the chip.
    fn process_tick(&mut self) {
        if self.transport.mode == PlayerMode::Stopped {
            return;
        }
        let audition = self.transport.mode == PlayerMode::Sample;
        let running = self.tick_context().step();
        self.push_registers(audition);
        if !running {
            log::debug!(
                "playback stopped at position {} line {}",
                self.transport.position,
                self.transport.line
            );
        }
    }

    fn push_registers(&mut self, audition: bool) {
        let regs = if audition {
            &self.audition.regs
        } else {
            &self.runtime.regs
        };
        let snapshot = RegisterSnapshot {
            regs: regs.clone(),
            mute: self.mute,
        };
        self.chip.set_all_regs(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{Pattern, Position, Sample};

    fn player() -> Player {
        let mut song = Song::new("t", "a");
        song.set_sample(1, Sample::parse(&["FF1.+000"]).unwrap().with_loop(0))
            .unwrap();
        let pat = song.add_pattern();
        song.set_pattern(pat, Pattern::parse(&["37010000000"]).unwrap())
            .unwrap();
        song.add_position(Position::new(4, 6).unwrap().with_channel(0, pat, 0));
        song.add_position(Position::new(2, 3).unwrap());
        Player::new(song, PlayerConfig::default()).unwrap()
    }

    #[test]
    fn test_new_counts_frames() {
        let player = player();
        assert_eq!(player.song().total_ticks(), 30);
        assert_eq!(player.samples_per_tick(), 882.0);
        assert_eq!(player.mode(), PlayerMode::Stopped);
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = PlayerConfig {
            interrupt_rate: 0,
            ..PlayerConfig::default()
        };
        assert!(Player::new(Song::default(), config).is_err());
    }

    #[test]
    fn test_edit_song_drops_entry_states() {
        let mut player = player();
        player.simulate_playback(|_| {}, || {});
        assert!(player.song().positions[1].initial_state.is_some());
        player.edit_song(|song| song.positions[0].speed = Speed::Plain(3));
        assert!(player.song().positions[1].initial_state.is_none());
        assert_eq!(player.song().total_ticks(), 18);
    }

    #[test]
    fn test_mute_reaches_chip() {
        let mut player = player();
        player.set_channel_mute(2, true);
        assert!(player.is_channel_muted(2));
        assert!(player.chip().is_channel_muted(2));
        player.set_channel_mute(9, true);
        assert!(!player.is_channel_muted(9));
    }

    #[test]
    fn test_elapsed_ticks_follow_transport() {
        let mut player = player();
        assert!(player.play_position(true, true, true));
        assert_eq!(player.elapsed_ticks(), 0);
        for _ in 0..8 {
            player.process_tick();
        }
        assert_eq!(player.line(), 1);
        assert_eq!(player.elapsed_ticks(), 8);
    }
}
