// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Visible window, bar lock and loop length.
//!
//! The window maps `width_steps` grid buttons onto a contiguous tick range
//! of the pattern. Without bar lock it moves a page at a time and follows
//! playback; with bar lock it is pinned to a bar boundary chosen by the
//! user and moves a bar at a time.

use std::ops::Range;

use tracing::debug;

use super::pattern::{MAX_LOOP_BARS, MIN_LOOP_BARS};
use super::resolution::{Direction, ResolutionEntry};
use crate::timing::{Tick, TimeSignature};

/// Contiguous tick range shown on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First visible tick
    pub offset: Tick,
    /// Number of steps the hardware grid can show
    pub width_steps: usize,
}

impl PageWindow {
    /// Create a window at offset 0
    pub fn new(width_steps: usize) -> Self {
        Self {
            offset: 0,
            width_steps,
        }
    }

    /// Ticks covered by one page at this resolution
    pub fn page_ticks(&self, resolution: &ResolutionEntry) -> Tick {
        self.width_steps as Tick * resolution.step_ticks
    }

    /// Absolute start of a displayed step
    pub fn step_start(&self, display_index: usize, resolution: &ResolutionEntry) -> Tick {
        self.offset
            .saturating_add((display_index as Tick).saturating_mul(resolution.step_ticks))
    }

    /// Tick range covered by a displayed step
    pub fn step_range(&self, display_index: usize, resolution: &ResolutionEntry) -> Range<Tick> {
        let start = self.step_start(display_index, resolution);
        start..start.saturating_add(resolution.step_ticks)
    }

    /// Tick range covered by the whole window
    pub fn range(&self, resolution: &ResolutionEntry) -> Range<Tick> {
        self.offset..self.offset.saturating_add(self.page_ticks(resolution))
    }

    /// Display index of a tick, or `None` if it is outside the window
    pub fn step_index_of(&self, tick: Tick, resolution: &ResolutionEntry) -> Option<usize> {
        if tick < self.offset || resolution.step_ticks == 0 {
            return None;
        }
        let index = ((tick - self.offset) / resolution.step_ticks) as usize;
        (index < self.width_steps).then_some(index)
    }
}

/// Pin of the window to a user-chosen bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarLock {
    /// Whether the lock is engaged
    pub engaged: bool,
    /// Pinned offset (always a bar boundary)
    pub locked_offset: Tick,
}

/// Loop length in bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthConfig {
    bars: u8,
}

impl LengthConfig {
    /// Create a length, clamped to 1..=8 bars
    pub fn new(bars: u8) -> Self {
        Self {
            bars: bars.clamp(MIN_LOOP_BARS, MAX_LOOP_BARS),
        }
    }

    /// Length in bars
    pub fn bars(&self) -> u8 {
        self.bars
    }

    /// Set the length, clamped to 1..=8 bars. Returns the applied value.
    pub fn set(&mut self, bars: u8) -> u8 {
        self.bars = bars.clamp(MIN_LOOP_BARS, MAX_LOOP_BARS);
        self.bars
    }

    /// Tick at which the loop ends
    pub fn loop_end(&self, signature: &TimeSignature) -> Tick {
        signature.loop_end(self.bars)
    }

    /// Whether a start tick lies inside the loop
    pub fn contains(&self, tick: Tick, signature: &TimeSignature) -> bool {
        tick < self.loop_end(signature)
    }
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self::new(MIN_LOOP_BARS)
    }
}

/// Window navigation with bar lock and playback follow
#[derive(Debug, Clone)]
pub struct Paginator {
    window: PageWindow,
    lock: BarLock,
    signature: TimeSignature,
    /// Last transport position seen, for follow decisions
    last_position: Option<Tick>,
}

impl Paginator {
    /// Create a paginator for a grid of `width_steps` steps
    pub fn new(width_steps: usize, signature: TimeSignature) -> Self {
        Self {
            window: PageWindow::new(width_steps),
            lock: BarLock::default(),
            signature,
            last_position: None,
        }
    }

    /// Current window
    pub fn window(&self) -> PageWindow {
        self.window
    }

    /// Current lock state
    pub fn lock(&self) -> BarLock {
        self.lock
    }

    /// Whether bar lock is engaged
    pub fn is_locked(&self) -> bool {
        self.lock.engaged
    }

    /// Bar structure used for lock steps
    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    /// Page index of the window (offset / page length)
    pub fn page(&self, resolution: &ResolutionEntry) -> u64 {
        let page = self.window.page_ticks(resolution);
        if page == 0 {
            0
        } else {
            self.window.offset / page
        }
    }

    /// Move one page (unlocked) or one bar (locked). Returns the new offset.
    pub fn advance_window(&mut self, direction: Direction, resolution: &ResolutionEntry) -> Tick {
        if self.lock.engaged {
            let bar = self.signature.ticks_per_bar();
            self.lock.locked_offset = step_offset(self.lock.locked_offset, bar, direction);
            self.window.offset = self.lock.locked_offset;
        } else {
            let page = self.window.page_ticks(resolution);
            self.window.offset = step_offset(self.window.offset, page, direction);
        }
        debug!(
            offset = self.window.offset,
            locked = self.lock.engaged,
            "window advanced"
        );
        self.window.offset
    }

    /// Flip bar lock. Engaging pins the current bar-aligned offset; releasing
    /// returns to the page that holds the playhead (or the current page).
    pub fn toggle_lock(&mut self, resolution: &ResolutionEntry) -> bool {
        if self.lock.engaged {
            self.lock.engaged = false;
            let page = self.window.page_ticks(resolution);
            let anchor = self.last_position.unwrap_or(self.window.offset);
            self.window.offset = align_down(anchor, page);
        } else {
            self.lock.engaged = true;
            self.lock.locked_offset = self.signature.bar_floor(self.window.offset);
            self.window.offset = self.lock.locked_offset;
        }
        debug!(engaged = self.lock.engaged, offset = self.window.offset, "bar lock toggled");
        self.lock.engaged
    }

    /// Keep the unlocked offset on a page boundary after a resolution change
    pub fn on_resolution_changed(&mut self, resolution: &ResolutionEntry) {
        if !self.lock.engaged {
            let page = self.window.page_ticks(resolution);
            self.window.offset = align_down(self.window.offset, page);
        }
    }

    /// Record a transport position and, when unlocked, move to the page that
    /// holds the playhead once it leaves a window it was inside.
    /// Returns whether the window moved.
    pub fn follow(&mut self, position: Option<Tick>, resolution: &ResolutionEntry) -> bool {
        let previous = self.last_position;
        self.last_position = position;
        if self.lock.engaged {
            return false;
        }
        let (Some(prev), Some(pos)) = (previous, position) else {
            return false;
        };
        let range = self.window.range(resolution);
        if range.contains(&prev) && !range.contains(&pos) {
            let page = self.window.page_ticks(resolution);
            self.window.offset = align_down(pos, page);
            debug!(offset = self.window.offset, "window following playback");
            return true;
        }
        false
    }

    /// Last transport position seen
    pub fn last_position(&self) -> Option<Tick> {
        self.last_position
    }

    /// Back to offset 0 with the lock released
    pub fn reset(&mut self) {
        self.window.offset = 0;
        self.lock = BarLock::default();
    }

    /// Change the grid width, keeping the offset page-aligned
    pub fn set_width(&mut self, width_steps: usize, resolution: &ResolutionEntry) {
        self.window.width_steps = width_steps;
        self.on_resolution_changed(resolution);
    }

    /// Change the bar structure
    pub fn set_signature(&mut self, signature: TimeSignature) {
        self.signature = signature;
        if self.lock.engaged {
            self.lock.locked_offset = signature.bar_floor(self.lock.locked_offset);
            self.window.offset = self.lock.locked_offset;
        }
    }
}

fn step_offset(offset: Tick, amount: Tick, direction: Direction) -> Tick {
    match direction {
        Direction::Next => offset.saturating_add(amount),
        Direction::Previous => offset.saturating_sub(amount),
    }
}

fn align_down(tick: Tick, unit: Tick) -> Tick {
    if unit == 0 {
        tick
    } else {
        tick - tick % unit
    }
}
