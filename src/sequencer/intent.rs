// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hardware intents accepted by the engine and what they did.

use super::pattern::{Pitch, ToggleOutcome};
use super::resolution::{Direction, ResolutionEntry};
use super::velocity::VelocityTier;
use crate::timing::Tick;

/// A single user action on the grid controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Toggle a displayed step; `None` edits the active pitch
    ToggleStep { pitch: Option<Pitch>, index: usize },
    /// Step the grid resolution
    CycleResolution(Direction),
    /// Move the window one page (or one bar under bar lock)
    CyclePage(Direction),
    /// Engage or release bar lock
    ToggleBarLock,
    /// Set the loop length in bars (clamped to 1..=8)
    SetLength(u8),
    /// Advance soft -> normal -> accent
    CycleVelocityTier,
    /// Select a velocity tier directly
    SetVelocityTier(VelocityTier),
    /// Hold or release the double time modifier
    SetDoubleTime(bool),
    /// Stage a bar for pasting
    BeginCopy(u32),
    /// Paste the staged bar into a bar
    Paste(u32),
    /// Drop the staged bar
    CancelCopy,
    /// Change the pitch being edited
    SetActivePitch(Pitch),
    /// Remove the active pitch's events in a bar
    ClearBar(u32),
    /// Remove every event in the clip
    ClearPattern,
}

impl Intent {
    /// Whether this intent reads or writes the bound pattern
    pub fn requires_clip(&self) -> bool {
        matches!(
            self,
            Intent::ToggleStep { .. }
                | Intent::SetLength(_)
                | Intent::BeginCopy(_)
                | Intent::Paste(_)
                | Intent::ClearBar(_)
                | Intent::ClearPattern
        )
    }
}

/// What a successful dispatch changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Step(ToggleOutcome),
    Resolution(ResolutionEntry),
    Page { offset: Tick },
    BarLock { engaged: bool },
    Length { bars: u8 },
    Tier(VelocityTier),
    DoubleTime(bool),
    Copied { bar: u32, events: usize },
    Pasted { bar: u32, events: usize },
    CopyCancelled,
    Pitch(Pitch),
    Cleared { events: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_intents() {
        assert!(Intent::ToggleStep {
            pitch: None,
            index: 0
        }
        .requires_clip());
        assert!(Intent::Paste(1).requires_clip());
        assert!(Intent::ClearPattern.requires_clip());
        assert!(Intent::BeginCopy(0).requires_clip());
        assert!(!Intent::CancelCopy.requires_clip());
        assert!(!Intent::CyclePage(Direction::Next).requires_clip());
        assert!(!Intent::SetActivePitch(38).requires_clip());
    }
}
