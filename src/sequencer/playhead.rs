// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playhead position within the visible window.

use super::resolution::ResolutionEntry;
use super::window::PageWindow;
use crate::timing::{beats_to_ticks, Tick};

/// Step under the transport position, or `None` when it is off-window
pub fn current_step(
    position: Tick,
    window: &PageWindow,
    resolution: &ResolutionEntry,
) -> Option<usize> {
    window.step_index_of(position, resolution)
}

/// [`current_step`] for a position in beats. Negative positions have no step.
pub fn current_step_beats(
    transport_beats: f64,
    window: &PageWindow,
    resolution: &ResolutionEntry,
) -> Option<usize> {
    beats_to_ticks(transport_beats).and_then(|tick| current_step(tick, window, resolution))
}

/// Latest transport position seen by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayheadTracker {
    position: Option<Tick>,
}

impl PlayheadTracker {
    /// Record a transport position in beats. Returns the position in ticks.
    pub fn update(&mut self, transport_beats: f64) -> Option<Tick> {
        self.position = beats_to_ticks(transport_beats);
        self.position
    }

    /// Forget the position (transport stopped)
    pub fn clear(&mut self) {
        self.position = None;
    }

    /// Last position in ticks
    pub fn position(&self) -> Option<Tick> {
        self.position
    }

    /// Step under the last position
    pub fn step(&self, window: &PageWindow, resolution: &ResolutionEntry) -> Option<usize> {
        self.position
            .and_then(|tick| current_step(tick, window, resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::resolution::{GridResolution, RESOLUTIONS};

    #[test]
    fn test_step_at_two_beats() {
        let window = PageWindow::new(32);
        let res = GridResolution::default().current();
        assert_eq!(current_step_beats(2.0, &window, &res), Some(8));
    }

    #[test]
    fn test_outside_window() {
        let window = PageWindow {
            offset: 384,
            width_steps: 32,
        };
        let res = GridResolution::default().current();
        assert_eq!(current_step_beats(3.99, &window, &res), None);
        assert_eq!(current_step_beats(4.0, &window, &res), Some(0));
        assert_eq!(current_step_beats(11.99, &window, &res), Some(31));
        assert_eq!(current_step_beats(12.0, &window, &res), None);
        assert_eq!(current_step_beats(-1.0, &window, &res), None);
    }

    #[test]
    fn test_triplet_steps() {
        let window = PageWindow::new(32);
        let res = RESOLUTIONS[4]; // 1/8t
        assert_eq!(current_step_beats(1.0, &window, &res), Some(3));
        assert_eq!(current_step_beats(0.34, &window, &res), Some(1));
    }

    #[test]
    fn test_tracker() {
        let mut tracker = PlayheadTracker::default();
        let window = PageWindow::new(16);
        let res = GridResolution::default().current();
        assert_eq!(tracker.step(&window, &res), None);
        assert_eq!(tracker.update(1.5), Some(144));
        assert_eq!(tracker.step(&window, &res), Some(6));
        tracker.clear();
        assert_eq!(tracker.position(), None);
    }
}
