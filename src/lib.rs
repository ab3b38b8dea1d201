// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Grid step sequencer engine.
//!
//! Edits a sparse, resolution independent note pattern through a paged
//! window of step pads, with bar lock, loop length, velocity tiers, double
//! time and bar copy/paste. Rendering, transport and clip storage live
//! behind small traits so the engine itself stays a pure state machine.

pub mod config;
pub mod control;
pub mod runtime;
pub mod sequencer;
pub mod timing;

pub use runtime::{EngineHandle, EngineRuntime};
pub use sequencer::{
    ClipBinding, DispatchOutcome, EngineSettings, GridReadModel, Intent, SequencerError,
    StepSequencerEngine, StepView,
};
