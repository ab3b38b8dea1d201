// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for pad controller input.
//!
//! This module provides:
//! - Named controller actions that turn into engine intents
//! - MIDI note/CC mapping with a default 8x8 pad controller layout
//! - A grid controller that feeds drum pad selection to the engine

pub mod midi_map;

pub use midi_map::{ControlEvent, MidiBinding, MidiBindingType, MidiController, MidiMappingEntry};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::sequencer::{Direction, Intent, PadSelection, Pitch, VelocityTier};

/// Action bound to a controller button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Step pad at a display index
    Step(usize),
    /// Drum pad selecting a pitch
    SelectPitch(Pitch),
    /// Cycle grid resolution
    Resolution(Direction),
    /// Move the window
    Page(Direction),
    /// Engage or release bar lock
    BarLock,
    /// Cycle velocity tier
    CycleTier,
    /// Momentary accent tier
    Accent,
    /// Momentary soft tier
    Soft,
    /// Momentary double time
    DoubleTime,
    /// Set loop length in bars
    Length(u8),
    /// Copy a bar
    BeginCopy(u32),
    /// Paste into a bar
    Paste(u32),
    /// Drop the staged copy
    CancelCopy,
    /// Clear the active pitch in a bar
    ClearBar(u32),
    /// Clear the whole clip
    ClearPattern,
}

impl ControlAction {
    /// Whether the action acts on release as well as press
    pub fn is_momentary(&self) -> bool {
        matches!(
            self,
            ControlAction::Accent | ControlAction::Soft | ControlAction::DoubleTime
        )
    }

    /// Intent for a button press (`pressed`) or release
    pub fn to_intent(&self, pressed: bool) -> Option<Intent> {
        if !pressed && !self.is_momentary() {
            return None;
        }
        let intent = match *self {
            ControlAction::Step(index) => Intent::ToggleStep { pitch: None, index },
            ControlAction::SelectPitch(pitch) => Intent::SetActivePitch(pitch),
            ControlAction::Resolution(dir) => Intent::CycleResolution(dir),
            ControlAction::Page(dir) => Intent::CyclePage(dir),
            ControlAction::BarLock => Intent::ToggleBarLock,
            ControlAction::CycleTier => Intent::CycleVelocityTier,
            ControlAction::Accent => Intent::SetVelocityTier(if pressed {
                VelocityTier::Accent
            } else {
                VelocityTier::Normal
            }),
            ControlAction::Soft => Intent::SetVelocityTier(if pressed {
                VelocityTier::Soft
            } else {
                VelocityTier::Normal
            }),
            ControlAction::DoubleTime => Intent::SetDoubleTime(pressed),
            ControlAction::Length(bars) => Intent::SetLength(bars),
            ControlAction::BeginCopy(bar) => Intent::BeginCopy(bar),
            ControlAction::Paste(bar) => Intent::Paste(bar),
            ControlAction::CancelCopy => Intent::CancelCopy,
            ControlAction::ClearBar(bar) => Intent::ClearBar(bar),
            ControlAction::ClearPattern => Intent::ClearPattern,
        };
        Some(intent)
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Step(index) => write!(f, "step:{}", index),
            ControlAction::SelectPitch(pitch) => write!(f, "pitch:{}", pitch),
            ControlAction::Resolution(Direction::Next) => write!(f, "resolution_next"),
            ControlAction::Resolution(Direction::Previous) => write!(f, "resolution_prev"),
            ControlAction::Page(Direction::Next) => write!(f, "page_next"),
            ControlAction::Page(Direction::Previous) => write!(f, "page_prev"),
            ControlAction::BarLock => write!(f, "bar_lock"),
            ControlAction::CycleTier => write!(f, "cycle_tier"),
            ControlAction::Accent => write!(f, "accent"),
            ControlAction::Soft => write!(f, "soft"),
            ControlAction::DoubleTime => write!(f, "double_time"),
            ControlAction::Length(bars) => write!(f, "length:{}", bars),
            ControlAction::BeginCopy(bar) => write!(f, "begin_copy:{}", bar),
            ControlAction::Paste(bar) => write!(f, "paste:{}", bar),
            ControlAction::CancelCopy => write!(f, "cancel_copy"),
            ControlAction::ClearBar(bar) => write!(f, "clear_bar:{}", bar),
            ControlAction::ClearPattern => write!(f, "clear_pattern"),
        }
    }
}

/// Error parsing an action name from configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("unknown action '{0}'")]
    Unknown(String),
    #[error("action '{0}' needs a numeric argument")]
    MissingArgument(String),
    #[error("invalid argument '{arg}' for action '{name}'")]
    InvalidArgument { name: String, arg: String },
}

impl FromStr for ControlAction {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s, None),
        };

        fn number<T: FromStr>(name: &str, arg: Option<&str>) -> Result<T, ActionParseError> {
            let arg = arg.ok_or_else(|| ActionParseError::MissingArgument(name.to_string()))?;
            arg.parse().map_err(|_| ActionParseError::InvalidArgument {
                name: name.to_string(),
                arg: arg.to_string(),
            })
        }

        let action = match name {
            "step" => ControlAction::Step(number(name, arg)?),
            "pitch" => {
                let pitch: Pitch = number(name, arg)?;
                if pitch > 127 {
                    return Err(ActionParseError::InvalidArgument {
                        name: name.to_string(),
                        arg: pitch.to_string(),
                    });
                }
                ControlAction::SelectPitch(pitch)
            }
            "resolution_next" => ControlAction::Resolution(Direction::Next),
            "resolution_prev" => ControlAction::Resolution(Direction::Previous),
            "page_next" => ControlAction::Page(Direction::Next),
            "page_prev" => ControlAction::Page(Direction::Previous),
            "bar_lock" => ControlAction::BarLock,
            "cycle_tier" => ControlAction::CycleTier,
            "accent" => ControlAction::Accent,
            "soft" => ControlAction::Soft,
            "double_time" => ControlAction::DoubleTime,
            "length" => ControlAction::Length(number(name, arg)?),
            "begin_copy" => ControlAction::BeginCopy(number(name, arg)?),
            "paste" => ControlAction::Paste(number(name, arg)?),
            "cancel_copy" => ControlAction::CancelCopy,
            "clear_bar" => ControlAction::ClearBar(number(name, arg)?),
            "clear_pattern" => ControlAction::ClearPattern,
            _ => return Err(ActionParseError::Unknown(s.to_string())),
        };
        Ok(action)
    }
}

/// Momentary tier buttons currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldTiers {
    pub accent: bool,
    pub soft: bool,
}

impl HeldTiers {
    /// Tier implied by the held buttons; accent wins over soft
    pub fn tier(&self) -> VelocityTier {
        if self.accent {
            VelocityTier::Accent
        } else if self.soft {
            VelocityTier::Soft
        } else {
            VelocityTier::Normal
        }
    }
}

/// Pad controller front end: MIDI in, intents out
pub struct GridController {
    midi: MidiController,
    pads: PadSelection,
    held: HeldTiers,
}

impl GridController {
    /// Create a controller with the default pad layout
    pub fn new(pads: PadSelection) -> Self {
        Self::with_mappings(MidiController::with_default_layout(), pads)
    }

    /// Create a controller with custom mappings
    pub fn with_mappings(midi: MidiController, pads: PadSelection) -> Self {
        Self {
            midi,
            pads,
            held: HeldTiers::default(),
        }
    }

    /// Get MIDI mappings
    pub fn midi(&self) -> &MidiController {
        &self.midi
    }

    /// Get mutable MIDI mappings
    pub fn midi_mut(&mut self) -> &mut MidiController {
        &mut self.midi
    }

    /// Drum pad selection shared with the engine
    pub fn pads(&self) -> &PadSelection {
        &self.pads
    }

    /// Tier buttons held right now
    pub fn held_tiers(&self) -> HeldTiers {
        self.held
    }

    /// Process a MIDI message
    pub fn process_midi(
        &mut self,
        channel: u8,
        status: u8,
        data1: u8,
        data2: u8,
    ) -> Option<Intent> {
        let event = self.midi.process_message(channel, status, data1, data2)?;
        match event.action {
            ControlAction::Accent => {
                self.held.accent = event.pressed;
                Some(Intent::SetVelocityTier(self.held.tier()))
            }
            ControlAction::Soft => {
                self.held.soft = event.pressed;
                Some(Intent::SetVelocityTier(self.held.tier()))
            }
            ControlAction::SelectPitch(pitch) if event.pressed => {
                self.pads.select(pitch);
                event.action.to_intent(true)
            }
            action => action.to_intent(event.pressed),
        }
    }
}

impl Default for GridController {
    fn default() -> Self {
        Self::new(PadSelection::default())
    }
}
