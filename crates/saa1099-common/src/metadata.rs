//! Song metadata.
//!
//! Tracker songs are timed in interrupt frames: one sequencer tick per
//! interrupt. Everything time-related a host displays (length, loop point,
//! loop length) is derived from frame counts and the interrupt rate.

use crate::FRAME_RATE_PAL;

/// Convert an interrupt-frame count to seconds (a zero rate counts as 1 Hz).
pub fn frames_to_seconds(frames: u64, frame_rate: u32) -> f32 {
    (frames as f64 / frame_rate.max(1) as f64) as f32
}

/// Song information shared by all players.
pub trait MetadataFields {
    /// Song title.
    fn title(&self) -> &str;

    /// Author/composer name.
    fn author(&self) -> &str;

    /// Format identifier, e.g. `"SAA"`.
    fn format(&self) -> &str;

    /// Interrupt frames of one pass through the song.
    fn frame_count(&self) -> u64;

    /// Interrupt rate in Hz.
    fn frame_rate(&self) -> u32 {
        FRAME_RATE_PAL
    }

    /// Number of rows in the song order.
    fn position_count(&self) -> usize;

    /// Song-order row playback wraps to, if the song loops.
    fn repeat_position(&self) -> Option<usize> {
        None
    }

    /// Frame at which the repeat position starts.
    fn loop_frame(&self) -> Option<u64> {
        None
    }

    /// Length of one pass in seconds.
    fn duration_seconds(&self) -> f32 {
        frames_to_seconds(self.frame_count(), self.frame_rate())
    }

    /// Length of the repeating section in seconds.
    fn loop_seconds(&self) -> Option<f32> {
        self.loop_frame().map(|start| {
            frames_to_seconds(self.frame_count().saturating_sub(start), self.frame_rate())
        })
    }
}

/// Marker over [`MetadataFields`] used as the bound of
/// [`ChiptunePlayer::Metadata`](crate::ChiptunePlayer::Metadata).
pub trait PlaybackMetadata: MetadataFields {}

impl<T: MetadataFields> PlaybackMetadata for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        rows: Vec<u64>,
        repeat: usize,
        rate: u32,
    }

    impl MetadataFields for Order {
        fn title(&self) -> &str {
            "order"
        }

        fn author(&self) -> &str {
            ""
        }

        fn format(&self) -> &str {
            "SAA"
        }

        fn frame_count(&self) -> u64 {
            self.rows.iter().sum()
        }

        fn frame_rate(&self) -> u32 {
            self.rate
        }

        fn position_count(&self) -> usize {
            self.rows.len()
        }

        fn repeat_position(&self) -> Option<usize> {
            (self.repeat < self.rows.len()).then_some(self.repeat)
        }

        fn loop_frame(&self) -> Option<u64> {
            self.repeat_position()
                .map(|p| self.rows[..p].iter().sum())
        }
    }

    #[test]
    fn test_loop_section_from_repeat_position() {
        let order = Order {
            rows: vec![64, 96, 32],
            repeat: 1,
            rate: 50,
        };
        assert_eq!(order.duration_seconds(), 3.84);
        assert_eq!(order.loop_frame(), Some(64));
        assert_eq!(order.loop_seconds(), Some(2.56));
    }

    #[test]
    fn test_repeat_past_the_order_does_not_loop() {
        let order = Order {
            rows: vec![50],
            repeat: 3,
            rate: 50,
        };
        assert_eq!(order.repeat_position(), None);
        assert_eq!(order.loop_seconds(), None);
    }

    #[test]
    fn test_zero_frame_rate_does_not_divide_by_zero() {
        assert_eq!(frames_to_seconds(10, 0), 10.0);
        assert_eq!(frames_to_seconds(90, 60), 1.5);
    }
}
