// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory note pattern.
//!
//! Events are keyed by `(pitch, start)` with `start` in absolute ticks from
//! the pattern origin. Display positions are never stored: a step index is
//! always derived from the current window and resolution, so switching
//! resolution cannot relocate anything that was already written.
//!
//! Every mutation is journaled as a [`PatternChange`] so the owner can
//! mirror it to whatever storage backs the pattern.

use std::collections::BTreeMap;
use std::ops::Range;

use super::resolution::ResolutionEntry;
use super::window::{LengthConfig, PageWindow};
use crate::timing::{ticks_to_beats, Tick, TimeSignature};

/// MIDI note number identifying a drum voice
pub type Pitch = u8;

/// Shortest allowed loop
pub const MIN_LOOP_BARS: u8 = 1;
/// Longest allowed loop
pub const MAX_LOOP_BARS: u8 = 8;

/// A single note in the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepEvent {
    /// Note number
    pub pitch: Pitch,
    /// Start in ticks from pattern origin
    pub start: Tick,
    /// Duration in ticks
    pub length: Tick,
    /// MIDI velocity
    pub velocity: u8,
}

impl StepEvent {
    /// Create a new event
    pub fn new(pitch: Pitch, start: Tick, length: Tick, velocity: u8) -> Self {
        Self {
            pitch,
            start,
            length,
            velocity,
        }
    }

    /// Start in beats
    pub fn start_beats(&self) -> f64 {
        ticks_to_beats(self.start)
    }

    /// Length in beats
    pub fn length_beats(&self) -> f64 {
        ticks_to_beats(self.length)
    }

    /// Tick at which the note ends
    pub fn end(&self) -> Tick {
        self.start.saturating_add(self.length)
    }
}

/// A mutation to be mirrored into storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternChange {
    /// Event written (inserted or replaced at its identity)
    Written(StepEvent),
    /// Event at this identity removed
    Removed { pitch: Pitch, start: Tick },
    /// Loop length changed
    LoopLength(u8),
}

/// Result of toggling a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A new event was written
    Added(StepEvent),
    /// The existing event's velocity was replaced
    Updated(StepEvent),
    /// The existing event was removed
    Removed(StepEvent),
}

impl ToggleOutcome {
    /// The event now occupying the step, if any
    pub fn event(&self) -> Option<StepEvent> {
        match self {
            ToggleOutcome::Added(e) | ToggleOutcome::Updated(e) => Some(*e),
            ToggleOutcome::Removed(_) => None,
        }
    }
}

/// How a toggle writes new events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOptions {
    /// Velocity for new events
    pub velocity: u8,
    /// Write two half-step events instead of one
    pub double_time: bool,
    /// Re-toggling with a different velocity updates instead of removing
    pub velocity_aware: bool,
}

/// Sparse note storage for one clip
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    notes: BTreeMap<Pitch, BTreeMap<Tick, StepEvent>>,
    length: LengthConfig,
    journal: Vec<PatternChange>,
}

impl Pattern {
    /// Create an empty pattern
    pub fn new(loop_bars: u8) -> Self {
        Self {
            notes: BTreeMap::new(),
            length: LengthConfig::new(loop_bars),
            journal: Vec::new(),
        }
    }

    /// Build a pattern from existing events without journaling them
    pub fn from_events(events: impl IntoIterator<Item = StepEvent>, loop_bars: u8) -> Self {
        let mut pattern = Self::new(loop_bars);
        for event in events {
            pattern
                .notes
                .entry(event.pitch)
                .or_default()
                .insert(event.start, event);
        }
        pattern
    }

    /// Loop length in bars
    pub fn loop_bars(&self) -> u8 {
        self.length.bars()
    }

    /// Loop length configuration
    pub fn length(&self) -> LengthConfig {
        self.length
    }

    /// Set the loop length, clamped to 1..=8 bars. Returns the applied value.
    pub fn set_loop_bars(&mut self, bars: u8) -> u8 {
        let previous = self.length.bars();
        let bars = self.length.set(bars);
        if bars != previous {
            self.journal.push(PatternChange::LoopLength(bars));
        }
        bars
    }

    /// Total number of events
    pub fn len(&self) -> usize {
        self.notes.values().map(BTreeMap::len).sum()
    }

    /// Check if the pattern has no events
    pub fn is_empty(&self) -> bool {
        self.notes.values().all(BTreeMap::is_empty)
    }

    /// Iterate every event, ordered by pitch then start
    pub fn events(&self) -> impl Iterator<Item = &StepEvent> {
        self.notes.values().flat_map(BTreeMap::values)
    }

    /// Event at an exact identity
    pub fn get(&self, pitch: Pitch, start: Tick) -> Option<&StepEvent> {
        self.notes.get(&pitch).and_then(|row| row.get(&start))
    }

    /// Write an event, replacing any event with the same identity
    pub fn insert(&mut self, event: StepEvent) -> Option<StepEvent> {
        self.journal.push(PatternChange::Written(event));
        self.notes
            .entry(event.pitch)
            .or_default()
            .insert(event.start, event)
    }

    /// Remove the event at an identity
    pub fn remove(&mut self, pitch: Pitch, start: Tick) -> Option<StepEvent> {
        let row = self.notes.get_mut(&pitch)?;
        let removed = row.remove(&start)?;
        if row.is_empty() {
            self.notes.remove(&pitch);
        }
        self.journal.push(PatternChange::Removed { pitch, start });
        Some(removed)
    }

    /// Events starting inside `range`, for one pitch or all pitches
    pub fn events_in(&self, pitch: Option<Pitch>, range: Range<Tick>) -> Vec<StepEvent> {
        match pitch {
            Some(p) => self
                .notes
                .get(&p)
                .map(|row| row.range(range).map(|(_, e)| *e).collect())
                .unwrap_or_default(),
            None => self
                .notes
                .values()
                .flat_map(|row| row.range(range.clone()).map(|(_, e)| *e))
                .collect(),
        }
    }

    /// First event of `pitch` starting inside `range`
    pub fn first_in(&self, pitch: Pitch, range: Range<Tick>) -> Option<&StepEvent> {
        self.notes
            .get(&pitch)
            .and_then(|row| row.range(range).next().map(|(_, e)| e))
    }

    /// Whether any event of `pitch` starts inside the displayed step
    pub fn is_active(
        &self,
        pitch: Pitch,
        display_index: usize,
        window: &PageWindow,
        resolution: &ResolutionEntry,
    ) -> bool {
        self.first_in(pitch, window.step_range(display_index, resolution))
            .is_some()
    }

    /// Toggle the step at `display_index` for `pitch`.
    ///
    /// Any events of `pitch` starting inside the step's tick range count as
    /// the step's contents, on the current grid or not: they are removed (or
    /// re-velocitied when velocity-aware). An empty step gets new events
    /// snapped to the current resolution's grid; nothing re-quantizes them
    /// later.
    pub fn toggle_step(
        &mut self,
        pitch: Pitch,
        display_index: usize,
        window: &PageWindow,
        resolution: &ResolutionEntry,
        options: ToggleOptions,
    ) -> ToggleOutcome {
        let range = window.step_range(display_index, resolution);
        let existing = self.events_in(Some(pitch), range.clone());

        if let Some(&first) = existing.first() {
            let restyle = options.velocity_aware
                && existing.iter().any(|e| e.velocity != options.velocity);
            if restyle {
                for event in &existing {
                    self.insert(StepEvent {
                        velocity: options.velocity,
                        ..*event
                    });
                }
                return ToggleOutcome::Updated(StepEvent {
                    velocity: options.velocity,
                    ..first
                });
            }
            for event in &existing {
                self.remove(pitch, event.start);
            }
            return ToggleOutcome::Removed(first);
        }

        let start = range.start;
        let step = resolution.step_ticks;
        let (length, count) = if options.double_time {
            (step / 2, 2)
        } else {
            (step, 1)
        };
        for i in 0..count {
            let s = start.saturating_add(i * length);
            self.insert(StepEvent::new(pitch, s, length, options.velocity));
        }
        ToggleOutcome::Added(StepEvent::new(pitch, start, length, options.velocity))
    }

    /// Remove every event of `pitch` inside `bar`. Returns how many were removed.
    pub fn clear_bar(&mut self, pitch: Pitch, bar: u32, signature: &TimeSignature) -> usize {
        let doomed = self.events_in(Some(pitch), signature.bar_range(bar));
        for event in &doomed {
            self.remove(event.pitch, event.start);
        }
        doomed.len()
    }

    /// Remove every event. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let doomed: Vec<StepEvent> = self.events().copied().collect();
        for event in &doomed {
            self.remove(event.pitch, event.start);
        }
        doomed.len()
    }

    /// Events that take part in looped playback (`start < loop end`)
    pub fn loop_events(&self, signature: &TimeSignature) -> Vec<StepEvent> {
        self.events_in(None, 0..self.length.loop_end(signature))
    }

    /// Grow the loop by whole bars until `end` fits, never past the maximum.
    pub fn extend_loop_to(&mut self, end: Tick, signature: &TimeSignature) -> Option<u8> {
        let loop_end = self.length.loop_end(signature);
        if end <= loop_end {
            return None;
        }
        let bar = signature.ticks_per_bar();
        let needed = (end.saturating_add(bar - 1) / bar).min(MAX_LOOP_BARS as Tick) as u8;
        if needed > self.length.bars() {
            Some(self.set_loop_bars(needed))
        } else {
            None
        }
    }

    /// Drop trailing bars with no events (any pitch), keeping at least one bar.
    pub fn contract_loop(&mut self, signature: &TimeSignature) -> Option<u8> {
        let mut bars = self.length.bars();
        while bars > MIN_LOOP_BARS {
            let last = signature.bar_range(bars as u32 - 1);
            if !self.events_in(None, last).is_empty() {
                break;
            }
            bars -= 1;
        }
        if bars != self.length.bars() {
            Some(self.set_loop_bars(bars))
        } else {
            None
        }
    }

    /// Take the changes journaled since the last call
    pub fn drain_changes(&mut self) -> Vec<PatternChange> {
        std::mem::take(&mut self.journal)
    }

    /// Discard journaled changes (used when rolling back)
    pub fn clear_changes(&mut self) {
        self.journal.clear();
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(MIN_LOOP_BARS)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::resolution::{GridResolution, RESOLUTIONS};
    use crate::timing::PPQN;

    const KICK: Pitch = 36;
    const SNARE: Pitch = 38;

    fn normal() -> ToggleOptions {
        ToggleOptions {
            velocity: 100,
            double_time: false,
            velocity_aware: false,
        }
    }

    fn sixteenth() -> ResolutionEntry {
        GridResolution::default().current()
    }

    #[test]
    fn test_toggle_snaps_to_window_grid() {
        let mut pattern = Pattern::default();
        let window = PageWindow {
            offset: 8 * PPQN,
            width_steps: 32,
        };
        let outcome = pattern.toggle_step(KICK, 3, &window, &sixteenth(), normal());
        let event = outcome.event().unwrap();
        assert_eq!(event.start, 8 * PPQN + 3 * 24);
        assert_eq!(event.length, 24);
        assert_eq!(event.velocity, 100);
        assert_eq!(event.start_beats(), 8.75);
    }

    #[test]
    fn test_toggle_twice_restores_pattern() {
        let mut pattern = Pattern::from_events([StepEvent::new(SNARE, 96, 24, 60)], 2);
        let before = pattern.clone();
        let window = PageWindow::new(32);

        pattern.toggle_step(KICK, 5, &window, &sixteenth(), normal());
        let outcome = pattern.toggle_step(KICK, 5, &window, &sixteenth(), normal());
        assert!(matches!(outcome, ToggleOutcome::Removed(_)));

        pattern.clear_changes();
        assert_eq!(pattern, before);
    }

    #[test]
    fn test_resolution_change_keeps_events_in_place() {
        let mut pattern = Pattern::default();
        let window = PageWindow::new(32);
        pattern.toggle_step(KICK, 6, &window, &sixteenth(), normal());

        // 1/8 grid: index 3 covers the same tick range start, event still found
        let eighth = RESOLUTIONS[5];
        assert!(pattern.is_active(KICK, 3, &window, &eighth));
        assert_eq!(pattern.get(KICK, 144).unwrap().length, 24);

        // 1/16t grid: event at tick 144 falls inside step 9 (144..160)
        let triplet = RESOLUTIONS[2];
        assert!(pattern.is_active(KICK, 9, &window, &triplet));
        assert!(!pattern.is_active(KICK, 8, &window, &triplet));
    }

    #[test]
    fn test_toggle_clears_off_grid_event_in_step() {
        let mut pattern = Pattern::default();
        let window = PageWindow::new(32);
        pattern.toggle_step(KICK, 1, &window, &sixteenth(), normal());
        assert!(pattern.get(KICK, 24).is_some());

        // 1/8t step 0 covers ticks 0..32 and shows the event at 24 as lit
        let triplet = RESOLUTIONS[4];
        assert!(pattern.is_active(KICK, 0, &window, &triplet));

        let outcome = pattern.toggle_step(KICK, 0, &window, &triplet, normal());
        assert!(matches!(outcome, ToggleOutcome::Removed(e) if e.start == 24));
        assert!(pattern.is_empty());
        assert!(!pattern.is_active(KICK, 0, &window, &triplet));

        // Pressing again writes on the 1/8t grid
        let outcome = pattern.toggle_step(KICK, 0, &window, &triplet, normal());
        assert!(matches!(outcome, ToggleOutcome::Added(e) if e.start == 0 && e.length == 32));
    }

    #[test]
    fn test_toggle_removes_every_event_in_step() {
        let mut pattern = Pattern::from_events(
            [
                StepEvent::new(KICK, 50, 10, 100),
                StepEvent::new(KICK, 60, 10, 100),
                StepEvent::new(KICK, 72, 24, 100),
                StepEvent::new(SNARE, 55, 10, 100),
            ],
            1,
        );
        let window = PageWindow::new(32);
        // 1/16 step 2 covers 48..72
        let outcome = pattern.toggle_step(KICK, 2, &window, &sixteenth(), normal());
        assert!(matches!(outcome, ToggleOutcome::Removed(e) if e.start == 50));
        assert_eq!(pattern.len(), 2);
        assert!(pattern.get(KICK, 72).is_some());
        assert!(pattern.get(SNARE, 55).is_some());
    }

    #[test]
    fn test_velocity_aware_toggle_updates_loaded_events() {
        let mut pattern = Pattern::from_events([StepEvent::new(KICK, 5, 20, 64)], 1);
        let window = PageWindow::new(32);
        let options = ToggleOptions {
            velocity: 127,
            double_time: false,
            velocity_aware: true,
        };
        let outcome = pattern.toggle_step(KICK, 0, &window, &sixteenth(), options);
        assert!(matches!(outcome, ToggleOutcome::Updated(e) if e.start == 5 && e.velocity == 127));
        assert_eq!(pattern.get(KICK, 5).unwrap().length, 20);
        assert_eq!(pattern.len(), 1);
    }

    #[test]
    fn test_velocity_aware_toggle_updates() {
        let mut pattern = Pattern::default();
        let window = PageWindow::new(32);
        let mut options = normal();
        options.velocity_aware = true;
        pattern.toggle_step(KICK, 0, &window, &sixteenth(), options);

        options.velocity = 127;
        let outcome = pattern.toggle_step(KICK, 0, &window, &sixteenth(), options);
        assert!(matches!(outcome, ToggleOutcome::Updated(e) if e.velocity == 127));
        assert_eq!(pattern.get(KICK, 0).unwrap().velocity, 127);

        // Same velocity again removes
        let outcome = pattern.toggle_step(KICK, 0, &window, &sixteenth(), options);
        assert!(matches!(outcome, ToggleOutcome::Removed(_)));
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_plain_toggle_ignores_velocity_difference() {
        let mut pattern = Pattern::default();
        let window = PageWindow::new(32);
        pattern.toggle_step(KICK, 0, &window, &sixteenth(), normal());

        let mut accent = normal();
        accent.velocity = 127;
        let outcome = pattern.toggle_step(KICK, 0, &window, &sixteenth(), accent);
        assert!(matches!(outcome, ToggleOutcome::Removed(_)));
    }

    #[test]
    fn test_double_time_writes_two_half_steps() {
        let mut pattern = Pattern::default();
        let window = PageWindow::new(32);
        let mut options = normal();
        options.double_time = true;

        pattern.toggle_step(KICK, 2, &window, &sixteenth(), options);
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.get(KICK, 48).unwrap().length, 12);
        assert_eq!(pattern.get(KICK, 60).unwrap().length, 12);

        pattern.toggle_step(KICK, 2, &window, &sixteenth(), options);
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_insert_replaces_identity() {
        let mut pattern = Pattern::default();
        pattern.insert(StepEvent::new(KICK, 0, 24, 100));
        let replaced = pattern.insert(StepEvent::new(KICK, 0, 12, 60));
        assert_eq!(replaced.unwrap().velocity, 100);
        assert_eq!(pattern.len(), 1);
    }

    #[test]
    fn test_clear_bar_only_touches_pitch_and_bar() {
        let sig = TimeSignature::default();
        let mut pattern = Pattern::from_events(
            [
                StepEvent::new(KICK, 0, 24, 100),
                StepEvent::new(KICK, 200, 24, 100),
                StepEvent::new(KICK, 400, 24, 100),
                StepEvent::new(SNARE, 96, 24, 100),
            ],
            2,
        );
        assert_eq!(pattern.clear_bar(KICK, 0, &sig), 2);
        assert_eq!(pattern.len(), 2);
        assert!(pattern.get(KICK, 400).is_some());
        assert!(pattern.get(SNARE, 96).is_some());
    }

    #[test]
    fn test_loop_events_respect_length() {
        let sig = TimeSignature::default();
        let mut pattern = Pattern::from_events(
            [
                StepEvent::new(KICK, 0, 24, 100),
                StepEvent::new(KICK, 3 * 384 - 24, 24, 100),
                StepEvent::new(KICK, 3 * 384, 24, 100),
            ],
            8,
        );
        pattern.set_loop_bars(3);
        let looped = pattern.loop_events(&sig);
        assert_eq!(looped.len(), 2);
        assert!(looped.iter().all(|e| e.start < 3 * 384));
        assert_eq!(pattern.len(), 3);
    }

    #[test]
    fn test_extend_and_contract_loop() {
        let sig = TimeSignature::default();
        let mut pattern = Pattern::new(1);
        pattern.insert(StepEvent::new(KICK, 2 * 384 + 10, 24, 100));
        assert_eq!(pattern.extend_loop_to(2 * 384 + 34, &sig), Some(3));
        assert_eq!(pattern.loop_bars(), 3);
        assert_eq!(pattern.extend_loop_to(100, &sig), None);

        pattern.remove(KICK, 2 * 384 + 10);
        pattern.insert(StepEvent::new(SNARE, 0, 24, 100));
        assert_eq!(pattern.contract_loop(&sig), Some(1));
    }

    #[test]
    fn test_extend_never_exceeds_max() {
        let sig = TimeSignature::default();
        let mut pattern = Pattern::new(1);
        assert_eq!(pattern.extend_loop_to(20 * 384, &sig), Some(MAX_LOOP_BARS));
    }

    #[test]
    fn test_journal_records_changes() {
        let mut pattern = Pattern::new(1);
        pattern.insert(StepEvent::new(KICK, 0, 24, 100));
        pattern.remove(KICK, 0);
        pattern.remove(KICK, 0);
        pattern.set_loop_bars(2);

        let changes = pattern.drain_changes();
        assert_eq!(
            changes,
            vec![
                PatternChange::Written(StepEvent::new(KICK, 0, 24, 100)),
                PatternChange::Removed {
                    pitch: KICK,
                    start: 0
                },
                PatternChange::LoopLength(2),
            ]
        );
        assert!(pattern.drain_changes().is_empty());
    }
}
