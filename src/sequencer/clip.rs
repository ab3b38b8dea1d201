// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clip storage binding.
//!
//! The clip is the persisted home of a pattern. The engine keeps its own
//! in-memory [`Pattern`](super::Pattern) and writes every change through
//! to the bound clip.

use std::sync::{Arc, Mutex};

use super::pattern::{PatternChange, Pitch, StepEvent, MIN_LOOP_BARS};
use crate::timing::Tick;

/// Storage the engine reads a pattern from and writes changes to
pub trait ClipBinding: Send {
    /// Clip name, for logs
    fn name(&self) -> String;

    /// Stored events, for one pitch or all
    fn get_events(&self, pitch: Option<Pitch>) -> Vec<StepEvent>;

    /// Write an event, replacing any at the same `(pitch, start)`
    fn write_event(&mut self, event: StepEvent);

    /// Remove the event at `(pitch, start)` if present
    fn remove_event(&mut self, pitch: Pitch, start: Tick);

    /// Loop length in bars
    fn loop_length(&self) -> u8;

    /// Set the loop length in bars
    fn set_loop_length(&mut self, bars: u8);

    /// Apply a journaled pattern change
    fn apply(&mut self, change: &PatternChange) {
        match *change {
            PatternChange::Written(event) => self.write_event(event),
            PatternChange::Removed { pitch, start } => self.remove_event(pitch, start),
            PatternChange::LoopLength(bars) => self.set_loop_length(bars),
        }
    }
}

/// A clip held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryClip {
    /// Clip name
    name: String,
    /// Events sorted by start, then pitch
    notes: Vec<StepEvent>,
    /// Loop length in bars
    loop_bars: u8,
}

impl MemoryClip {
    /// Create a new empty clip
    pub fn new(name: impl Into<String>, loop_bars: u8) -> Self {
        Self {
            name: name.into(),
            notes: Vec::new(),
            loop_bars: loop_bars.max(MIN_LOOP_BARS),
        }
    }

    /// Create a clip pre-filled with events
    pub fn with_events(
        name: impl Into<String>,
        loop_bars: u8,
        events: impl IntoIterator<Item = StepEvent>,
    ) -> Self {
        let mut clip = Self::new(name, loop_bars);
        for event in events {
            clip.write_event(event);
        }
        clip
    }

    /// All stored events
    pub fn notes(&self) -> &[StepEvent] {
        &self.notes
    }

    /// Get number of notes
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> SharedClip {
        SharedClip(Arc::new(Mutex::new(self)))
    }
}

impl ClipBinding for MemoryClip {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn get_events(&self, pitch: Option<Pitch>) -> Vec<StepEvent> {
        self.notes
            .iter()
            .filter(|n| pitch.map_or(true, |p| n.pitch == p))
            .copied()
            .collect()
    }

    fn write_event(&mut self, event: StepEvent) {
        self.remove_event(event.pitch, event.start);
        self.notes.push(event);
        // Keep notes sorted by start time
        self.notes.sort_by_key(|n| (n.start, n.pitch));
    }

    fn remove_event(&mut self, pitch: Pitch, start: Tick) {
        self.notes.retain(|n| !(n.pitch == pitch && n.start == start));
    }

    fn loop_length(&self) -> u8 {
        self.loop_bars
    }

    fn set_loop_length(&mut self, bars: u8) {
        self.loop_bars = bars;
    }
}

/// A [`MemoryClip`] that stays observable after it is handed to the engine
#[derive(Debug, Clone)]
pub struct SharedClip(Arc<Mutex<MemoryClip>>);

impl SharedClip {
    /// Run `f` against the clip
    pub fn with<R>(&self, f: impl FnOnce(&MemoryClip) -> R) -> R {
        let guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut MemoryClip) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl ClipBinding for SharedClip {
    fn name(&self) -> String {
        self.with(|clip| clip.name())
    }

    fn get_events(&self, pitch: Option<Pitch>) -> Vec<StepEvent> {
        self.with(|clip| clip.get_events(pitch))
    }

    fn write_event(&mut self, event: StepEvent) {
        self.with_mut(|clip| clip.write_event(event))
    }

    fn remove_event(&mut self, pitch: Pitch, start: Tick) {
        self.with_mut(|clip| clip.remove_event(pitch, start))
    }

    fn loop_length(&self) -> u8 {
        self.with(|clip| clip.loop_length())
    }

    fn set_loop_length(&mut self, bars: u8) {
        self.with_mut(|clip| clip.set_loop_length(bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_creation() {
        let clip = MemoryClip::new("Beat", 2);
        assert_eq!(clip.name(), "Beat");
        assert_eq!(clip.loop_length(), 2);
        assert_eq!(clip.note_count(), 0);
    }

    #[test]
    fn test_write_replaces_identity() {
        let mut clip = MemoryClip::new("Beat", 1);
        clip.write_event(StepEvent::new(36, 0, 24, 100));
        clip.write_event(StepEvent::new(36, 0, 24, 60));
        clip.write_event(StepEvent::new(38, 0, 24, 100));
        assert_eq!(clip.note_count(), 2);
        assert_eq!(clip.get_events(Some(36))[0].velocity, 60);
    }

    #[test]
    fn test_notes_sorted() {
        let clip = MemoryClip::with_events(
            "Beat",
            1,
            [
                StepEvent::new(36, 96, 24, 100),
                StepEvent::new(38, 0, 24, 100),
                StepEvent::new(36, 48, 24, 100),
            ],
        );
        let starts: Vec<u64> = clip.notes().iter().map(|n| n.start).collect();
        assert_eq!(starts, vec![0, 48, 96]);
    }

    #[test]
    fn test_apply_changes() {
        let mut clip = MemoryClip::new("Beat", 1);
        clip.apply(&PatternChange::Written(StepEvent::new(36, 0, 24, 100)));
        clip.apply(&PatternChange::LoopLength(4));
        assert_eq!(clip.note_count(), 1);
        assert_eq!(clip.loop_length(), 4);

        clip.apply(&PatternChange::Removed { pitch: 36, start: 0 });
        assert_eq!(clip.note_count(), 0);
    }

    #[test]
    fn test_shared_clip_observes_writes() {
        let shared = MemoryClip::new("Beat", 1).shared();
        let mut handle: Box<dyn ClipBinding> = Box::new(shared.clone());
        handle.write_event(StepEvent::new(40, 24, 24, 127));
        assert_eq!(shared.with(|clip| clip.note_count()), 1);
    }
}
