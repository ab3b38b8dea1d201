// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Two-phase bar copy/paste.
//!
//! A copy captures one bar's events with bar-relative starts; the buffer
//! stays staged across any number of pastes until it is replaced by a new
//! copy or cancelled.

use serde::{Deserialize, Serialize};

use super::error::SequencerError;
use super::pattern::{Pattern, Pitch, StepEvent};
use crate::timing::TimeSignature;

/// Which voices a copy captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyScope {
    /// Only the pitch being edited; pastes onto whichever pitch is active then
    #[default]
    ActivePitch,
    /// Every pitch in the bar; pastes keep each event's pitch
    AllPitches,
}

/// Stage state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CopyPasteStage {
    #[default]
    Idle,
    Staged {
        source_bar: u32,
        scope: CopyScope,
        /// Events with `start` relative to the bar start
        buffer: Vec<StepEvent>,
    },
}

impl CopyPasteStage {
    /// Capture `bar` from the pattern. Returns how many events were staged.
    pub fn begin_copy(
        &mut self,
        pattern: &Pattern,
        bar: u32,
        scope: CopyScope,
        pitch: Pitch,
        signature: &TimeSignature,
    ) -> usize {
        let bar_start = signature.bar_start(bar);
        let filter = match scope {
            CopyScope::ActivePitch => Some(pitch),
            CopyScope::AllPitches => None,
        };
        let buffer: Vec<StepEvent> = pattern
            .events_in(filter, signature.bar_range(bar))
            .into_iter()
            .map(|e| StepEvent {
                start: e.start - bar_start,
                ..e
            })
            .collect();
        let count = buffer.len();
        *self = CopyPasteStage::Staged {
            source_bar: bar,
            scope,
            buffer,
        };
        count
    }

    /// Write the staged bar into `bar`, overwriting events at the same
    /// identities. Stays staged. Returns how many events were written.
    pub fn paste_to(
        &self,
        pattern: &mut Pattern,
        bar: u32,
        pitch: Pitch,
        signature: &TimeSignature,
    ) -> Result<usize, SequencerError> {
        let CopyPasteStage::Staged { scope, buffer, .. } = self else {
            return Err(SequencerError::NothingStaged);
        };
        if buffer.is_empty() {
            return Err(SequencerError::NothingStaged);
        }
        let bar_start = signature.bar_start(bar);
        for event in buffer {
            let target_pitch = match scope {
                CopyScope::ActivePitch => pitch,
                CopyScope::AllPitches => event.pitch,
            };
            pattern.insert(StepEvent {
                pitch: target_pitch,
                start: bar_start + event.start,
                ..*event
            });
        }
        Ok(buffer.len())
    }

    /// Drop the buffer
    pub fn cancel(&mut self) {
        *self = CopyPasteStage::Idle;
    }

    /// Whether a buffer is staged
    pub fn is_staged(&self) -> bool {
        matches!(self, CopyPasteStage::Staged { .. })
    }

    /// Bar the staged buffer came from
    pub fn source_bar(&self) -> Option<u32> {
        match self {
            CopyPasteStage::Staged { source_bar, .. } => Some(*source_bar),
            CopyPasteStage::Idle => None,
        }
    }

    /// Staged events (bar-relative)
    pub fn buffer(&self) -> &[StepEvent] {
        match self {
            CopyPasteStage::Staged { buffer, .. } => buffer,
            CopyPasteStage::Idle => &[],
        }
    }
}
