// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use thiserror::Error;

/// Reasons an intent was rejected. None of these are fatal; the engine state
/// is left exactly as it was before the intent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    #[error("no clip is bound to the sequencer")]
    Unbound,
    #[error("nothing staged to paste")]
    NothingStaged,
    #[error("step index {index} outside grid of width {width}")]
    OutOfRange { index: usize, width: usize },
}
