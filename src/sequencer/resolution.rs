// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Grid resolution table.
//!
//! The set of step subdivisions is fixed; the selection is an index into
//! it that wraps when cycled.

use crate::timing::{ticks_to_beats, Tick, PPQN};

/// Direction for cycling selectors and pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// One entry of the resolution table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionEntry {
    /// Display label
    pub label: &'static str,
    /// Step duration in ticks
    pub step_ticks: Tick,
    /// Whether this is a triplet subdivision
    pub is_triplet: bool,
}

impl ResolutionEntry {
    const fn new(label: &'static str, step_ticks: Tick, is_triplet: bool) -> Self {
        Self {
            label,
            step_ticks,
            is_triplet,
        }
    }

    /// Step duration in beats
    pub fn step_duration_beats(&self) -> f64 {
        ticks_to_beats(self.step_ticks)
    }
}

/// Supported resolutions, finest first
pub const RESOLUTIONS: [ResolutionEntry; 8] = [
    ResolutionEntry::new("1/32t", PPQN / 12, true),
    ResolutionEntry::new("1/32", PPQN / 8, false),
    ResolutionEntry::new("1/16t", PPQN / 6, true),
    ResolutionEntry::new("1/16", PPQN / 4, false),
    ResolutionEntry::new("1/8t", PPQN / 3, true),
    ResolutionEntry::new("1/8", PPQN / 2, false),
    ResolutionEntry::new("1/4t", PPQN * 2 / 3, true),
    ResolutionEntry::new("1/4", PPQN, false),
];

/// Index of 1/16 in `RESOLUTIONS`
pub const DEFAULT_RESOLUTION_INDEX: usize = 3;

/// Current grid resolution selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridResolution {
    index: usize,
}

impl GridResolution {
    /// Select a resolution by table index (clamped)
    pub fn new(index: usize) -> Self {
        Self {
            index: index.min(RESOLUTIONS.len() - 1),
        }
    }

    /// Select a resolution by label, e.g. "1/16t"
    pub fn from_label(label: &str) -> Option<Self> {
        RESOLUTIONS
            .iter()
            .position(|r| r.label == label)
            .map(Self::new)
    }

    /// Current table index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current entry
    pub fn current(&self) -> ResolutionEntry {
        RESOLUTIONS[self.index]
    }

    /// Step the selection, wrapping at both ends
    pub fn cycle(&mut self, direction: Direction) -> ResolutionEntry {
        let len = RESOLUTIONS.len();
        self.index = match direction {
            Direction::Next => (self.index + 1) % len,
            Direction::Previous => (self.index + len - 1) % len,
        };
        self.current()
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_INDEX)
    }
}
