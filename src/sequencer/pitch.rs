// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Source of the pitch being edited.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::pattern::Pitch;

/// First drum rack pad note
pub const DEFAULT_PITCH: Pitch = 36;

/// Something that knows which pitch is selected (e.g. the last drum pad hit)
pub trait PitchSource {
    fn current_pitch(&self) -> Pitch;
}

/// Drum pad selection shared between a pad controller and the engine
#[derive(Debug, Clone)]
pub struct PadSelection {
    pitch: Arc<AtomicU8>,
}

impl PadSelection {
    /// Start with `pitch` selected
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch: Arc::new(AtomicU8::new(pitch.min(127))),
        }
    }

    /// Select a pad. Returns whether the pitch changed.
    pub fn select(&self, pitch: Pitch) -> bool {
        self.pitch.swap(pitch.min(127), Ordering::Relaxed) != pitch.min(127)
    }
}

impl Default for PadSelection {
    fn default() -> Self {
        Self::new(DEFAULT_PITCH)
    }
}

impl PitchSource for PadSelection {
    fn current_pitch(&self) -> Pitch {
        self.pitch.load(Ordering::Relaxed)
    }
}
