// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo-driven transport.
//!
//! Produces a running musical position in beats from wall-clock time.
//! The engine only needs something that can answer "where are we now";
//! this is the built-in answer used by the demo binary and tests.

use std::time::{Duration, Instant};

/// Anything that can report the current musical position.
pub trait TransportSource {
    /// Current position in beats, or `None` while stopped
    fn position(&self) -> Option<f64>;
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
    Paused,
}

/// Internal transport clocked from `Instant`
#[derive(Debug)]
pub struct Transport {
    /// Current tempo in BPM
    bpm: f64,
    /// Current state
    state: TransportState,
    /// When the current run segment started
    started_at: Option<Instant>,
    /// Beats accumulated before the current run segment
    accumulated: f64,
    /// Loop length in beats (position wraps when set)
    loop_beats: Option<f64>,
}

impl Transport {
    /// Create a stopped transport at the given tempo
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(20.0, 300.0),
            state: TransportState::Stopped,
            started_at: None,
            accumulated: 0.0,
            loop_beats: None,
        }
    }

    /// Get the tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo, keeping the current position
    pub fn set_bpm(&mut self, bpm: f64) {
        if self.state == TransportState::Running {
            self.accumulated = self.raw_position_at(Instant::now());
            self.started_at = Some(Instant::now());
        }
        self.bpm = bpm.clamp(20.0, 300.0);
    }

    /// Wrap the reported position at `beats` (None disables looping)
    pub fn set_loop(&mut self, beats: Option<f64>) {
        self.loop_beats = beats.filter(|b| *b > 0.0);
    }

    /// Get the current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Start from the beginning
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start from the beginning, anchored at `now`
    pub fn start_at(&mut self, now: Instant) {
        self.state = TransportState::Running;
        self.accumulated = 0.0;
        self.started_at = Some(now);
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.accumulated = 0.0;
        self.started_at = None;
    }

    /// Pause, keeping the position
    pub fn pause(&mut self) {
        if self.state == TransportState::Running {
            self.accumulated = self.raw_position_at(Instant::now());
            self.started_at = None;
            self.state = TransportState::Paused;
        }
    }

    /// Continue from a pause
    pub fn continue_playback(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Running;
            self.started_at = Some(Instant::now());
        }
    }

    /// Duration of one beat at the current tempo
    pub fn beat_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm)
    }

    /// Position in beats at a given instant
    pub fn position_at(&self, now: Instant) -> Option<f64> {
        if self.state == TransportState::Stopped {
            return None;
        }
        let raw = self.raw_position_at(now);
        Some(match self.loop_beats {
            Some(len) => raw % len,
            None => raw,
        })
    }

    fn raw_position_at(&self, now: Instant) -> f64 {
        match self.started_at {
            Some(start) => {
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                self.accumulated + elapsed * self.bpm / 60.0
            }
            None => self.accumulated,
        }
    }
}

impl TransportSource for Transport {
    fn position(&self) -> Option<f64> {
        self.position_at(Instant::now())
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(120.0)
    }
}
