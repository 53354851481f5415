//! Silent simulation: seeking, position entry states and register traces.
//!
//! A simulation runs the normal tick path on a private runtime. The
//! [`SimulationGuard`] swaps that runtime (and the transport) in and puts the
//! caller's state back when dropped, whichever way the simulation exits.

use std::ops::{Deref, DerefMut};

use log::debug;
use saa1099::{RegisterFile, Saa1099Backend};

use super::{Player, PlayerMode, Transport};
use crate::runtime::Runtime;

/// Scoped swap of a player's runtime and transport.
///
/// Dereferences to the player; the original state is restored on drop.
pub struct SimulationGuard<'a, B: Saa1099Backend> {
    player: &'a mut Player<B>,
    saved_runtime: Runtime,
    saved_transport: Transport,
}

impl<'a, B: Saa1099Backend> SimulationGuard<'a, B> {
    /// Swap `runtime` into `player` until the guard is dropped.
    pub fn new(player: &'a mut Player<B>, runtime: Runtime) -> Self {
        let saved_runtime = std::mem::replace(&mut player.runtime, runtime);
        let saved_transport = player.transport;
        Self {
            player,
            saved_runtime,
            saved_transport,
        }
    }
}

impl<B: Saa1099Backend> Deref for SimulationGuard<'_, B> {
    type Target = Player<B>;

    fn deref(&self) -> &Player<B> {
        self.player
    }
}

impl<B: Saa1099Backend> DerefMut for SimulationGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Player<B> {
        self.player
    }
}

impl<B: Saa1099Backend> Drop for SimulationGuard<'_, B> {
    fn drop(&mut self) {
        self.player.runtime = std::mem::take(&mut self.saved_runtime);
        self.player.transport = self.saved_transport;
    }
}

impl<B: Saa1099Backend> Player<B> {
    /// Run `f` with `runtime` swapped in for the song runtime.
    ///
    /// The player's own runtime and transport are restored afterwards, also
    /// when `f` panics.
    pub fn simulate_with<R>(&mut self, runtime: Runtime, f: impl FnOnce(&mut Player<B>) -> R) -> R {
        let mut guard = SimulationGuard::new(self, runtime);
        f(&mut guard)
    }

    /// Run the whole song once, silently.
    ///
    /// `per_frame` receives the register image after every tick (its change
    /// log holds the writes of that tick). `on_loop` is called once, just
    /// before the first frame of the repeat position. Returns the number of
    /// ticks rendered. The chip and the live playback state are untouched.
    pub fn simulate_playback<F, L>(&mut self, mut per_frame: F, on_loop: L) -> u32
    where
        F: FnMut(&RegisterFile),
        L: FnOnce(),
    {
        if self.song.positions.is_empty() {
            return 0;
        }
        self.simulate_with(Runtime::new(), |player| {
            player.transport = Transport::start(PlayerMode::Simulation, 0);
            let mut on_loop = Some(on_loop);
            let mut ticks = 0u32;
            while player.tick_context().step() {
                if player.transport.take_repeat_event() {
                    if let Some(callback) = on_loop.take() {
                        callback();
                    }
                }
                per_frame(&player.runtime.regs);
                ticks += 1;
            }
            ticks
        })
    }

    /// Jump to a line of a position, rebuilding the exact live state.
    ///
    /// The current mode is kept; while stopped only the cursor moves. Returns
    /// `false` for a missing position or line.
    pub fn seek(&mut self, position: usize, line: usize) -> bool {
        let Some(length) = self.song.positions.get(position).map(|p| p.length) else {
            return false;
        };
        if line >= length {
            return false;
        }

        let mode = match self.transport.mode {
            PlayerMode::Sample | PlayerMode::Simulation => PlayerMode::Stopped,
            mode => mode,
        };
        if mode == PlayerMode::Stopped {
            // Only the cursor moves; playback rebuilds the state on start.
            self.transport = Transport {
                line,
                ..Transport::start(mode, position)
            };
            return true;
        }

        self.runtime = self.ensure_position_state(position);
        self.transport = Transport::start(mode, position);
        self.fast_forward(line);
        self.pending = 0.0;
        self.push_registers(false);

        debug!("seek to position {position} line {line}");
        true
    }

    /// Silently run ticks until the next tick loads `line` of the current
    /// position.
    pub(crate) fn fast_forward(&mut self, line: usize) {
        if line == 0 {
            return;
        }
        let mode = self.transport.mode;
        self.transport.mode = PlayerMode::Simulation;
        while !(self.transport.started
            && self.transport.line + 1 >= line
            && self.transport.tick >= self.transport.line_ticks)
        {
            if !self.tick_context().step() {
                break;
            }
        }
        if self.transport.mode == PlayerMode::Simulation {
            self.transport.mode = mode;
        }
    }

    /// Entry state of a position, simulating from the nearest stored
    /// earlier state when it is missing.
    pub(crate) fn ensure_position_state(&mut self, target: usize) -> Runtime {
        if let Some(state) = self.stored_state(target) {
            return state;
        }

        let from = (0..target)
            .rev()
            .find(|&p| self.song.positions[p].initial_state.is_some());
        let (from, runtime) = match from {
            Some(p) => (p, self.stored_state(p).unwrap_or_default()),
            None => (0, Runtime::new()),
        };
        debug!("rebuilding entry state of position {target} from position {from}");

        self.simulate_with(runtime, |player| {
            player.transport = Transport::start(PlayerMode::Simulation, from);
            while player.song.positions[target].initial_state.is_none() {
                if !player.tick_context().step() {
                    break;
                }
            }
        });
        self.stored_state(target).unwrap_or_default()
    }

    fn stored_state(&self, position: usize) -> Option<Runtime> {
        self.song
            .positions
            .get(position)
            .and_then(|p| p.initial_state.as_deref())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::song::{Pattern, Position, Sample, Song};

    fn player() -> Player {
        let mut song = Song::new("t", "a");
        song.set_sample(1, Sample::parse(&["FF1.+000"]).unwrap().with_loop(0))
            .unwrap();
        let pat = song.add_pattern();
        song.set_pattern(
            pat,
            Pattern::parse(&["37010000000", "00000000000", "00000000112"]).unwrap(),
        )
        .unwrap();
        song.add_position(Position::new(4, 2).unwrap().with_channel(0, pat, 0));
        song.add_position(Position::new(4, 2).unwrap().with_channel(0, pat, 12));
        song.add_position(Position::new(2, 2).unwrap().with_channel(0, pat, 0));
        song.repeat_position = 1;
        Player::new(song, PlayerConfig::default()).unwrap()
    }

    #[test]
    fn test_guard_restores_state() {
        let mut player = player();
        assert!(player.play_position(true, true, true));
        player.process_tick();
        let before = player.runtime.clone();
        let transport = player.transport;

        let ticks = player.simulate_with(Runtime::new(), |p| {
            p.transport = Transport::start(PlayerMode::Simulation, 2);
            let mut n = 0;
            while p.tick_context().step() {
                n += 1;
            }
            n
        });
        assert_eq!(ticks, 4);
        assert_eq!(player.runtime, before);
        assert_eq!(player.transport, transport);
    }

    #[test]
    fn test_simulate_counts_ticks_and_loop_point() {
        let mut player = player();
        let mut frames = 0;
        let mut loop_at = None;
        let seen = std::cell::Cell::new(0u32);
        let ticks = player.simulate_playback(
            |_| {
                frames += 1;
                seen.set(seen.get() + 1);
            },
            || loop_at = Some(seen.get()),
        );
        assert_eq!(ticks, 20);
        assert_eq!(frames, 20);
        assert_eq!(loop_at, Some(8));
        assert_eq!(player.mode(), PlayerMode::Stopped);
    }

    #[test]
    fn test_simulation_records_entry_states() {
        let mut player = player();
        player.simulate_playback(|_| {}, || {});
        assert!(player.song().positions.iter().all(|p| p.initial_state.is_some()));
        let entry = player.song().positions[1].initial_state.as_deref().unwrap();
        assert_eq!(entry.channels[0].pitch, 12);
        assert_eq!(entry.channels[0].line, 0);
        // portamento from position 0 line 2 is still latched
        assert!(entry.channels[0].effect.is_some());
    }

    #[test]
    fn test_seek_matches_straight_playback() {
        let mut straight = player();
        assert!(straight.play_position(true, true, true));
        for _ in 0..12 {
            straight.process_tick();
        }
        assert_eq!((straight.position(), straight.line()), (1, 1));
        assert_eq!(straight.tick(), 2);

        let mut seeked = player();
        assert!(seeked.play_position(true, true, true));
        assert!(seeked.seek(1, 2));
        assert_eq!(seeked.mode(), PlayerMode::Song);

        seeked.process_tick();
        straight.process_tick();
        assert_eq!((seeked.position(), seeked.line()), (1, 2));
        assert_eq!(seeked.runtime(), straight.runtime());
    }

    #[test]
    fn test_channel_stop_does_not_leak_into_entry_states() {
        // channel 0 holds its note from position 0 into position 1
        let held = || {
            let mut song = Song::new("t", "a");
            song.set_sample(1, Sample::parse(&["FF1.+000"]).unwrap().with_loop(0))
                .unwrap();
            let pat = song.add_pattern();
            song.set_pattern(pat, Pattern::parse(&["37010000000"]).unwrap())
                .unwrap();
            song.add_position(Position::new(2, 2).unwrap().with_channel(0, pat, 0));
            song.add_position(Position::new(2, 2).unwrap());
            Player::new(song, PlayerConfig::default()).unwrap()
        };

        let mut edited = held();
        assert!(edited.play_position(true, true, true));
        edited.process_tick();
        edited.stop(Some(0));
        for _ in 0..4 {
            edited.process_tick();
        }
        assert_eq!(edited.position(), 1);
        assert!(!edited.runtime().channels[0].playing);
        assert!(edited.song().positions[1].initial_state.is_none());
        edited.stop(None);

        let mut straight = held();
        assert!(straight.play_position(true, true, true));
        for _ in 0..5 {
            straight.process_tick();
        }
        assert_eq!((straight.position(), straight.line()), (1, 0));

        assert!(edited.play_position(true, true, true));
        assert!(edited.seek(1, 0));
        edited.process_tick();
        assert!(edited.runtime().channels[0].playing);
        assert_eq!(edited.runtime(), straight.runtime());
    }

    #[test]
    fn test_seek_rejects_missing_targets() {
        let mut player = player();
        assert!(!player.seek(3, 0));
        assert!(!player.seek(2, 2));
        assert!(player.seek(2, 1));
        assert_eq!(player.mode(), PlayerMode::Stopped);
        assert_eq!((player.position(), player.line()), (2, 1));

        // resuming from the cursor plays the sought line first
        assert!(player.play_position(false, false, false));
        player.process_tick();
        assert_eq!((player.position(), player.line()), (2, 1));
    }
}
