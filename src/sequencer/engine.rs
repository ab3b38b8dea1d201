// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step sequencer engine.
//!
//! Owns every piece of editing state and is the only thing that mutates the
//! pattern. Hardware intents go through [`StepSequencerEngine::dispatch`],
//! transport positions through [`StepSequencerEngine::on_transport_tick`],
//! and renderers read [`StepSequencerEngine::read_model`].
//!
//! Rebinding the clip resets the copy stage, bar lock and window; the
//! resolution, velocity tier, double time and active pitch carry over.

use tracing::{debug, info, warn};

use super::clip::ClipBinding;
use super::clipboard::{CopyPasteStage, CopyScope};
use super::error::SequencerError;
use super::intent::{DispatchOutcome, Intent};
use super::pattern::{Pattern, Pitch, StepEvent, ToggleOptions, ToggleOutcome};
use super::pitch::{PitchSource, DEFAULT_PITCH};
use super::playhead::PlayheadTracker;
use super::resolution::{GridResolution, ResolutionEntry, DEFAULT_RESOLUTION_INDEX};
use super::velocity::{TierSelector, VelocityMap, VelocityTier};
use super::window::{PageWindow, Paginator};
use crate::timing::{Tick, TimeSignature, TransportSource};

/// Session settings for the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Steps the hardware grid shows
    pub width_steps: usize,
    /// Bar structure
    pub signature: TimeSignature,
    /// Velocity written for each tier
    pub velocities: VelocityMap,
    /// What a copy captures
    pub copy_scope: CopyScope,
    /// Re-toggling with another tier updates the velocity instead of removing
    pub velocity_aware_toggle: bool,
    /// Grow the loop when a step is written past its end
    pub auto_extend_length: bool,
    /// Shrink the loop when trailing bars become empty
    pub auto_contract_length: bool,
    /// Resolution table index selected at start
    pub default_resolution: usize,
    /// Pitch edited at start
    pub default_pitch: Pitch,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            width_steps: 32,
            signature: TimeSignature::default(),
            velocities: VelocityMap::default(),
            copy_scope: CopyScope::default(),
            velocity_aware_toggle: false,
            auto_extend_length: false,
            auto_contract_length: false,
            default_resolution: DEFAULT_RESOLUTION_INDEX,
            default_pitch: DEFAULT_PITCH,
        }
    }
}

/// One displayed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView {
    pub display_index: usize,
    /// An event of the active pitch starts in this step
    pub active: bool,
    /// Tier of the first such event
    pub tier: Option<VelocityTier>,
    /// The transport is inside this step
    pub is_playhead: bool,
    /// The step starts before the loop end
    pub in_loop: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct GridReadModel {
    /// Exactly `width_steps` entries
    pub steps: Vec<StepView>,
    pub pitch: Pitch,
    pub resolution: ResolutionEntry,
    pub offset: Tick,
    pub page: u64,
    pub bar_lock: bool,
    pub loop_bars: Option<u8>,
    pub tier: VelocityTier,
    pub double_time: bool,
    pub staged_bar: Option<u32>,
    pub playhead: Option<usize>,
    pub bound: bool,
}

struct BoundClip {
    clip: Box<dyn ClipBinding>,
    pattern: Pattern,
}

impl BoundClip {
    /// Mirror journaled pattern changes into the clip
    fn commit(&mut self) {
        for change in self.pattern.drain_changes() {
            self.clip.apply(&change);
        }
    }
}

/// The step sequencer engine
pub struct StepSequencerEngine {
    settings: EngineSettings,
    resolution: GridResolution,
    tiers: TierSelector,
    paginator: Paginator,
    stage: CopyPasteStage,
    playhead: PlayheadTracker,
    pitch: Pitch,
    double_time: bool,
    bound: Option<BoundClip>,
}

impl StepSequencerEngine {
    /// Create an unbound engine
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            resolution: GridResolution::new(settings.default_resolution),
            tiers: TierSelector::default(),
            paginator: Paginator::new(settings.width_steps, settings.signature),
            stage: CopyPasteStage::default(),
            playhead: PlayheadTracker::default(),
            pitch: settings.default_pitch.min(127),
            double_time: false,
            bound: None,
            settings,
        }
    }

    /// Bind a clip, loading its events. Any previous clip is released.
    pub fn bind_clip(&mut self, clip: Box<dyn ClipBinding>) -> Option<Box<dyn ClipBinding>> {
        let pattern = Pattern::from_events(clip.get_events(None), clip.loop_length());
        info!(
            clip = %clip.name(),
            events = pattern.len(),
            bars = pattern.loop_bars(),
            "clip bound"
        );
        let previous = self.bound.replace(BoundClip { clip, pattern });
        self.reset_clip_scoped_state();
        previous.map(|b| b.clip)
    }

    /// Release the bound clip
    pub fn unbind_clip(&mut self) -> Option<Box<dyn ClipBinding>> {
        let previous = self.bound.take();
        if let Some(ref b) = previous {
            info!(clip = %b.clip.name(), "clip unbound");
        }
        self.reset_clip_scoped_state();
        previous.map(|b| b.clip)
    }

    fn reset_clip_scoped_state(&mut self) {
        self.stage.cancel();
        self.paginator.reset();
    }

    /// Whether a clip is bound
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Apply one intent. On error nothing changes.
    pub fn dispatch(&mut self, intent: Intent) -> Result<DispatchOutcome, SequencerError> {
        let result = self.apply_intent(intent);
        match &result {
            Ok(outcome) => debug!(?intent, ?outcome, "intent applied"),
            Err(err) => warn!(?intent, %err, "intent rejected"),
        }
        result
    }

    fn apply_intent(&mut self, intent: Intent) -> Result<DispatchOutcome, SequencerError> {
        if let Intent::ToggleStep { index, .. } = intent {
            if index >= self.settings.width_steps {
                return Err(SequencerError::OutOfRange {
                    index,
                    width: self.settings.width_steps,
                });
            }
        }
        if intent.requires_clip() && self.bound.is_none() {
            return Err(SequencerError::Unbound);
        }

        let res = self.resolution.current();
        let signature = self.settings.signature;

        let outcome = match intent {
            Intent::ToggleStep { pitch, index } => {
                let pitch = pitch.unwrap_or(self.pitch).min(127);
                let window = self.paginator.window();
                let options = ToggleOptions {
                    velocity: self.settings.velocities.velocity(self.tiers.current()),
                    double_time: self.double_time,
                    velocity_aware: self.settings.velocity_aware_toggle,
                };
                let auto_extend = self.settings.auto_extend_length;
                let auto_contract = self.settings.auto_contract_length;
                let bound = self.bound_mut()?;
                let outcome = bound
                    .pattern
                    .toggle_step(pitch, index, &window, &res, options);
                match outcome {
                    ToggleOutcome::Added(_) if auto_extend => {
                        let step_end = window.step_range(index, &res).end;
                        bound.pattern.extend_loop_to(step_end, &signature);
                    }
                    ToggleOutcome::Removed(_) if auto_contract => {
                        bound.pattern.contract_loop(&signature);
                    }
                    _ => {}
                }
                bound.commit();
                DispatchOutcome::Step(outcome)
            }
            Intent::CycleResolution(direction) => {
                let entry = self.resolution.cycle(direction);
                self.paginator.on_resolution_changed(&entry);
                DispatchOutcome::Resolution(entry)
            }
            Intent::CyclePage(direction) => DispatchOutcome::Page {
                offset: self.paginator.advance_window(direction, &res),
            },
            Intent::ToggleBarLock => DispatchOutcome::BarLock {
                engaged: self.paginator.toggle_lock(&res),
            },
            Intent::SetLength(bars) => {
                let bound = self.bound_mut()?;
                let bars = bound.pattern.set_loop_bars(bars);
                bound.commit();
                DispatchOutcome::Length { bars }
            }
            Intent::CycleVelocityTier => DispatchOutcome::Tier(self.tiers.cycle()),
            Intent::SetVelocityTier(tier) => {
                self.tiers.set(tier);
                DispatchOutcome::Tier(tier)
            }
            Intent::SetDoubleTime(on) => {
                self.double_time = on;
                DispatchOutcome::DoubleTime(on)
            }
            Intent::BeginCopy(bar) => {
                let scope = self.settings.copy_scope;
                let pitch = self.pitch;
                let bound = self.bound.as_ref().ok_or(SequencerError::Unbound)?;
                let events = self
                    .stage
                    .begin_copy(&bound.pattern, bar, scope, pitch, &signature);
                DispatchOutcome::Copied { bar, events }
            }
            Intent::Paste(bar) => {
                let pitch = self.pitch;
                let bound = self.bound.as_mut().ok_or(SequencerError::Unbound)?;
                let events = self
                    .stage
                    .paste_to(&mut bound.pattern, bar, pitch, &signature)?;
                bound.commit();
                DispatchOutcome::Pasted { bar, events }
            }
            Intent::CancelCopy => {
                self.stage.cancel();
                DispatchOutcome::CopyCancelled
            }
            Intent::SetActivePitch(pitch) => {
                self.pitch = pitch.min(127);
                DispatchOutcome::Pitch(self.pitch)
            }
            Intent::ClearBar(bar) => {
                let pitch = self.pitch;
                let auto_contract = self.settings.auto_contract_length;
                let bound = self.bound_mut()?;
                let events = bound.pattern.clear_bar(pitch, bar, &signature);
                if auto_contract && events > 0 {
                    bound.pattern.contract_loop(&signature);
                }
                bound.commit();
                DispatchOutcome::Cleared { events }
            }
            Intent::ClearPattern => {
                let auto_contract = self.settings.auto_contract_length;
                let bound = self.bound_mut()?;
                let events = bound.pattern.clear_all();
                if auto_contract {
                    bound.pattern.contract_loop(&signature);
                }
                bound.commit();
                DispatchOutcome::Cleared { events }
            }
        };
        Ok(outcome)
    }

    fn bound_mut(&mut self) -> Result<&mut BoundClip, SequencerError> {
        self.bound.as_mut().ok_or(SequencerError::Unbound)
    }

    /// Record a transport position in beats. Returns whether the window moved
    /// to follow playback.
    pub fn on_transport_tick(&mut self, position: f64) -> bool {
        let tick = self.playhead.update(position);
        let res = self.resolution.current();
        self.paginator.follow(tick, &res)
    }

    /// Forget the playhead (transport stopped)
    pub fn on_transport_stopped(&mut self) {
        self.playhead.clear();
        let res = self.resolution.current();
        self.paginator.follow(None, &res);
    }

    /// Read a transport source and apply its position
    pub fn poll_transport(&mut self, source: &dyn TransportSource) -> bool {
        match source.position() {
            Some(position) => self.on_transport_tick(position),
            None => {
                self.on_transport_stopped();
                false
            }
        }
    }

    /// Re-read the selected pitch after a change notification.
    /// Returns whether the active pitch changed.
    pub fn observe_pitch(&mut self, source: &dyn PitchSource) -> bool {
        let pitch = source.current_pitch().min(127);
        if pitch == self.pitch {
            return false;
        }
        debug!(from = self.pitch, to = pitch, "active pitch changed");
        self.pitch = pitch;
        true
    }

    /// Replace the session settings, keeping the pattern and selections
    pub fn apply_settings(&mut self, settings: EngineSettings) {
        let res = self.resolution.current();
        if settings.width_steps != self.settings.width_steps {
            self.paginator.set_width(settings.width_steps, &res);
        }
        if settings.signature != self.settings.signature {
            self.paginator.set_signature(settings.signature);
        }
        info!(width = settings.width_steps, "engine settings applied");
        self.settings = settings;
    }

    /// Snapshot of the grid for the active pitch
    pub fn read_model(&self) -> GridReadModel {
        let window = self.paginator.window();
        let res = self.resolution.current();
        let playhead = self.playhead.step(&window, &res);
        let pattern = self.bound.as_ref().map(|b| &b.pattern);
        let loop_end = pattern.map(|p| p.length().loop_end(&self.settings.signature));

        let steps = (0..window.width_steps)
            .map(|index| {
                let range = window.step_range(index, &res);
                let first = pattern.and_then(|p| p.first_in(self.pitch, range.clone()));
                StepView {
                    display_index: index,
                    active: first.is_some(),
                    tier: first.map(|e| self.settings.velocities.classify(e.velocity)),
                    is_playhead: playhead == Some(index),
                    in_loop: loop_end.map_or(false, |end| range.start < end),
                }
            })
            .collect();

        GridReadModel {
            steps,
            pitch: self.pitch,
            resolution: res,
            offset: window.offset,
            page: self.paginator.page(&res),
            bar_lock: self.paginator.is_locked(),
            loop_bars: pattern.map(Pattern::loop_bars),
            tier: self.tiers.current(),
            double_time: self.double_time,
            staged_bar: self.stage.source_bar(),
            playhead,
            bound: self.bound.is_some(),
        }
    }

    /// Events that take part in looped playback
    pub fn loop_events(&self) -> Result<Vec<StepEvent>, SequencerError> {
        let bound = self.bound.as_ref().ok_or(SequencerError::Unbound)?;
        Ok(bound.pattern.loop_events(&self.settings.signature))
    }

    /// The bound pattern
    pub fn pattern(&self) -> Option<&Pattern> {
        self.bound.as_ref().map(|b| &b.pattern)
    }

    /// Whether the displayed step holds an event of `pitch`
    pub fn is_active(&self, pitch: Pitch, display_index: usize) -> bool {
        let res = self.resolution.current();
        self.pattern().map_or(false, |p| {
            p.is_active(pitch, display_index, &self.paginator.window(), &res)
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn active_pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn resolution(&self) -> ResolutionEntry {
        self.resolution.current()
    }

    pub fn tier(&self) -> VelocityTier {
        self.tiers.current()
    }

    pub fn window(&self) -> PageWindow {
        self.paginator.window()
    }

    pub fn is_locked(&self) -> bool {
        self.paginator.is_locked()
    }

    pub fn double_time(&self) -> bool {
        self.double_time
    }

    pub fn copy_stage(&self) -> &CopyPasteStage {
        &self.stage
    }
}

impl Default for StepSequencerEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
