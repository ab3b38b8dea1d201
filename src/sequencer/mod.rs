// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step sequencer core.
//!
//! This module provides the grid editing model:
//! - Sparse pattern storage keyed by `(pitch, start)`
//! - Resolution table, velocity tiers and double time
//! - Paged window with bar lock and playback follow
//! - Two-phase bar copy/paste
//! - The engine that ties them to a bound clip

pub mod clip;
pub mod clipboard;
pub mod engine;
pub mod error;
pub mod intent;
pub mod pattern;
pub mod pitch;
pub mod playhead;
pub mod resolution;
pub mod velocity;
pub mod window;

pub use clip::{ClipBinding, MemoryClip, SharedClip};
pub use clipboard::{CopyPasteStage, CopyScope};
pub use engine::{EngineSettings, GridReadModel, StepSequencerEngine, StepView};
pub use error::SequencerError;
pub use intent::{DispatchOutcome, Intent};
pub use pattern::{
    Pattern, PatternChange, Pitch, StepEvent, ToggleOptions, ToggleOutcome, MAX_LOOP_BARS,
    MIN_LOOP_BARS,
};
pub use pitch::{PadSelection, PitchSource, DEFAULT_PITCH};
pub use playhead::{current_step, current_step_beats, PlayheadTracker};
pub use resolution::{
    Direction, GridResolution, ResolutionEntry, DEFAULT_RESOLUTION_INDEX, RESOLUTIONS,
};
pub use velocity::{TierSelector, VelocityMap, VelocityTier};
pub use window::{BarLock, LengthConfig, PageWindow, Paginator};
