// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! Musical time is stored as integer ticks at a fixed resolution so that
//! every grid subdivision (straight, triplet, and the half steps used by
//! double time) lands on an exact tick. Beats only appear at the edges,
//! where positions come in from a transport or go out to a caller.

pub mod transport;

use std::ops::Range;

pub use transport::{Transport, TransportSource, TransportState};

/// Ticks per quarter note
pub const PPQN: u64 = 96;

/// Position or duration in ticks from pattern origin
pub type Tick = u64;

/// Tolerance applied before flooring so that values such as `1.0 / 3.0`
/// land on the tick they denote.
const BEAT_EPSILON: f64 = 1e-6;

/// Latest representable position. Larger beat positions are capped here.
pub const MAX_TICK: Tick = 1 << 48;

/// Convert a beat position to ticks, flooring to the containing tick.
///
/// Returns `None` for negative or non-finite positions (e.g. a count-in).
/// Positions past [`MAX_TICK`] are capped to it.
pub fn beats_to_ticks(beats: f64) -> Option<Tick> {
    if !beats.is_finite() || beats < 0.0 {
        return None;
    }
    let ticks = (beats * PPQN as f64 + BEAT_EPSILON).floor();
    Some((ticks as Tick).min(MAX_TICK))
}

/// Convert ticks to beats
pub fn ticks_to_beats(ticks: Tick) -> f64 {
    ticks as f64 / PPQN as f64
}

/// Bar structure of the edited pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per bar (time signature numerator)
    pub beats_per_bar: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats_per_bar: 4 }
    }
}

impl TimeSignature {
    /// Create a time signature with the given number of beats per bar
    pub fn new(beats_per_bar: u8) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
        }
    }

    /// Get ticks per bar
    pub fn ticks_per_bar(&self) -> Tick {
        PPQN * self.beats_per_bar as Tick
    }

    /// Bar duration in beats
    pub fn bar_duration_beats(&self) -> f64 {
        self.beats_per_bar as f64
    }

    /// Tick at which a bar starts
    pub fn bar_start(&self, bar: u32) -> Tick {
        bar as Tick * self.ticks_per_bar()
    }

    /// Tick range covered by a bar
    pub fn bar_range(&self, bar: u32) -> Range<Tick> {
        let start = self.bar_start(bar);
        start..start + self.ticks_per_bar()
    }

    /// Bar containing a tick (0-indexed)
    pub fn bar_of(&self, tick: Tick) -> u32 {
        (tick / self.ticks_per_bar()) as u32
    }

    /// Round a tick down to the start of its bar
    pub fn bar_floor(&self, tick: Tick) -> Tick {
        tick - tick % self.ticks_per_bar()
    }

    /// Tick at which a loop of `bars` bars ends
    pub fn loop_end(&self, bars: u8) -> Tick {
        bars as Tick * self.ticks_per_bar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_to_ticks() {
        assert_eq!(beats_to_ticks(0.0), Some(0));
        assert_eq!(beats_to_ticks(0.25), Some(24));
        assert_eq!(beats_to_ticks(2.0), Some(192));
        assert_eq!(beats_to_ticks(1.0 / 3.0), Some(32));
        assert_eq!(beats_to_ticks(-0.5), None);
        assert_eq!(beats_to_ticks(f64::NAN), None);
    }

    #[test]
    fn test_huge_positions_are_capped() {
        assert_eq!(beats_to_ticks(1e30), Some(MAX_TICK));
        assert_eq!(beats_to_ticks(f64::MAX), Some(MAX_TICK));
        assert_eq!(beats_to_ticks(f64::INFINITY), None);
    }

    #[test]
    fn test_ticks_to_beats() {
        assert_eq!(ticks_to_beats(48), 0.5);
        assert_eq!(ticks_to_beats(PPQN * 8), 8.0);
    }

    #[test]
    fn test_time_signature_defaults() {
        let sig = TimeSignature::default();
        assert_eq!(sig.beats_per_bar, 4);
        assert_eq!(sig.ticks_per_bar(), 384);
        assert_eq!(sig.bar_duration_beats(), 4.0);
    }

    #[test]
    fn test_bar_math() {
        let sig = TimeSignature::default();
        assert_eq!(sig.bar_start(2), 768);
        assert_eq!(sig.bar_range(1), 384..768);
        assert_eq!(sig.bar_of(383), 0);
        assert_eq!(sig.bar_of(384), 1);
        assert_eq!(sig.bar_floor(500), 384);
        assert_eq!(sig.loop_end(3), 1152);
    }

    #[test]
    fn test_zero_beats_per_bar_is_clamped() {
        let sig = TimeSignature::new(0);
        assert_eq!(sig.beats_per_bar, 1);
    }
}
