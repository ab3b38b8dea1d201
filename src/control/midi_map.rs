// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI controller mapping.
//!
//! Binds notes and CCs to [`ControlAction`]s. The default layout targets an
//! 8x8 pad controller: the top four rows are step pads, the lower left 4x4
//! block selects drum pitches, the lower right 4x2 block holds the control
//! pads, and the track and scene buttons pick loop length and copy/paste bars.

use super::ControlAction;
use crate::sequencer::Direction;

/// MIDI message status bytes
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
}

/// Channel the pad grid sends on in drum mode
pub const PAD_CHANNEL: u8 = 9;
/// Channel of the track and scene buttons
pub const BUTTON_CHANNEL: u8 = 0;

/// Type of MIDI binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiBindingType {
    /// Note on/off
    Note,
    /// Control Change (CC)
    ControlChange,
}

/// A MIDI binding identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiBinding {
    /// Binding type
    pub binding_type: MidiBindingType,
    /// MIDI channel (0-15, or None for any channel)
    pub channel: Option<u8>,
    /// Note or CC number
    pub data1: u8,
}

impl MidiBinding {
    /// Create a note binding
    pub fn note(channel: u8, note: u8) -> Self {
        Self {
            binding_type: MidiBindingType::Note,
            channel: Some(channel),
            data1: note,
        }
    }

    /// Create a note binding for any channel
    pub fn note_any(note: u8) -> Self {
        Self {
            binding_type: MidiBindingType::Note,
            channel: None,
            data1: note,
        }
    }

    /// Create a CC binding
    pub fn cc(channel: u8, cc: u8) -> Self {
        Self {
            binding_type: MidiBindingType::ControlChange,
            channel: Some(channel),
            data1: cc,
        }
    }

    /// Create a CC binding for any channel
    pub fn cc_any(cc: u8) -> Self {
        Self {
            binding_type: MidiBindingType::ControlChange,
            channel: None,
            data1: cc,
        }
    }

    /// Check if this binding matches a MIDI message
    pub fn matches(&self, channel: u8, status: u8, data1: u8) -> bool {
        if let Some(ch) = self.channel {
            if ch != channel {
                return false;
            }
        }

        let type_matches = match (self.binding_type, status & 0xF0) {
            (MidiBindingType::Note, status::NOTE_ON | status::NOTE_OFF) => true,
            (MidiBindingType::ControlChange, status::CONTROL_CHANGE) => true,
            _ => false,
        };

        type_matches && self.data1 == data1
    }
}

/// A mapping entry
#[derive(Debug, Clone, PartialEq)]
pub struct MidiMappingEntry {
    /// The binding
    pub binding: MidiBinding,
    /// The action to perform
    pub action: ControlAction,
    /// Description
    pub description: String,
}

impl MidiMappingEntry {
    /// Create a new mapping entry
    pub fn new(binding: MidiBinding, action: ControlAction) -> Self {
        Self {
            binding,
            action,
            description: String::new(),
        }
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

/// A matched button press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub action: ControlAction,
    pub pressed: bool,
}

/// MIDI controller with configurable mappings
#[derive(Debug, Clone, Default)]
pub struct MidiController {
    mappings: Vec<MidiMappingEntry>,
}

impl MidiController {
    /// Create a controller with no mappings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with the 8x8 pad layout
    pub fn with_default_layout() -> Self {
        let mut controller = Self::new();

        for index in 0..32 {
            controller.add_mapping(
                MidiMappingEntry::new(
                    MidiBinding::note(PAD_CHANNEL, step_pad_note(index)),
                    ControlAction::Step(index),
                )
                .description(format!("Step {}", index + 1)),
            );
        }

        // Drum pads, bottom row first, pitches ascending
        for (row, base_note) in [64u8, 72, 80, 88].into_iter().enumerate() {
            for col in 0..4u8 {
                let pitch = 36 + row as u8 * 4 + col;
                controller.add_mapping(
                    MidiMappingEntry::new(
                        MidiBinding::note(PAD_CHANNEL, base_note + col),
                        ControlAction::SelectPitch(pitch),
                    )
                    .description(format!("Drum pad {}", pitch)),
                );
            }
        }

        let controls = [
            (92, ControlAction::BarLock, "Bar lock"),
            (93, ControlAction::DoubleTime, "Double time"),
            (94, ControlAction::Resolution(Direction::Next), "Resolution"),
            (95, ControlAction::CycleTier, "Velocity tier"),
            (84, ControlAction::Page(Direction::Previous), "Previous page"),
            (85, ControlAction::Page(Direction::Next), "Next page"),
            (86, ControlAction::Accent, "Accent"),
            (87, ControlAction::Soft, "Soft"),
        ];
        for (note, action, desc) in controls {
            controller.add_mapping(
                MidiMappingEntry::new(MidiBinding::note(PAD_CHANNEL, note), action)
                    .description(desc),
            );
        }

        for bars in 1..=8u8 {
            controller.add_mapping(
                MidiMappingEntry::new(
                    MidiBinding::note(BUTTON_CHANNEL, 99 + bars),
                    ControlAction::Length(bars),
                )
                .description(format!("Length {} bars", bars)),
            );
        }

        for bar in 0..4u8 {
            controller.add_mapping(
                MidiMappingEntry::new(
                    MidiBinding::note(BUTTON_CHANNEL, 112 + bar),
                    ControlAction::BeginCopy(bar as u32),
                )
                .description(format!("Copy bar {}", bar + 1)),
            );
            controller.add_mapping(
                MidiMappingEntry::new(
                    MidiBinding::note(BUTTON_CHANNEL, 116 + bar),
                    ControlAction::Paste(bar as u32),
                )
                .description(format!("Paste to bar {}", bar + 1)),
            );
        }

        controller
    }

    /// Add a mapping
    pub fn add_mapping(&mut self, entry: MidiMappingEntry) {
        self.mappings.push(entry);
    }

    /// Bind an action, replacing whatever the binding did before
    pub fn add_binding(&mut self, binding: MidiBinding, action: ControlAction) {
        self.remove_binding(&binding);
        self.mappings.push(MidiMappingEntry::new(binding, action));
    }

    /// Remove mappings for a binding
    pub fn remove_binding(&mut self, binding: &MidiBinding) {
        self.mappings.retain(|m| &m.binding != binding);
    }

    /// Clear all mappings
    pub fn clear(&mut self) {
        self.mappings.clear();
    }

    /// Match a MIDI message. Note off, note on with velocity 0 and CC value 0
    /// are releases.
    pub fn process_message(
        &self,
        channel: u8,
        status: u8,
        data1: u8,
        data2: u8,
    ) -> Option<ControlEvent> {
        let entry = self
            .mappings
            .iter()
            .find(|m| m.binding.matches(channel, status, data1))?;
        let pressed = status & 0xF0 != status::NOTE_OFF && data2 > 0;
        Some(ControlEvent {
            action: entry.action,
            pressed,
        })
    }

    /// Get all mappings for display
    pub fn mappings(&self) -> &[MidiMappingEntry] {
        &self.mappings
    }
}

/// Note of a step pad. Index 0 is the top left pad; rows run downward.
pub fn step_pad_note(index: usize) -> u8 {
    let row = (index / 8) as u8;
    let col = (index % 8) as u8;
    120 - row * 8 + col
}

/// Format a MIDI binding for display
pub fn format_binding(binding: &MidiBinding) -> String {
    let channel = binding
        .channel
        .map(|c| format!("Ch{} ", c + 1))
        .unwrap_or_default();

    match binding.binding_type {
        MidiBindingType::Note => {
            let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
            let octave = (binding.data1 / 12) as i8 - 1;
            let name = note_names[(binding.data1 % 12) as usize];
            format!("{}Note {}{}", channel, name, octave)
        }
        MidiBindingType::ControlChange => format!("{}CC {}", channel, binding.data1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_binding_note() {
        let binding = MidiBinding::note(9, 120);
        assert!(binding.matches(9, status::NOTE_ON, 120));
        assert!(binding.matches(9, status::NOTE_OFF, 120));
        assert!(!binding.matches(0, status::NOTE_ON, 120));
        assert!(!binding.matches(9, status::NOTE_ON, 121));
        assert!(!binding.matches(9, status::CONTROL_CHANGE, 120));
    }

    #[test]
    fn test_midi_binding_any_channel() {
        let binding = MidiBinding::cc_any(1);
        assert!(binding.matches(0, status::CONTROL_CHANGE, 1));
        assert!(binding.matches(15, status::CONTROL_CHANGE, 1));
        assert!(!binding.matches(0, status::NOTE_ON, 1));
    }

    #[test]
    fn test_step_pad_notes() {
        assert_eq!(step_pad_note(0), 120);
        assert_eq!(step_pad_note(7), 127);
        assert_eq!(step_pad_note(8), 112);
        assert_eq!(step_pad_note(31), 103);
    }

    #[test]
    fn test_default_layout_is_unambiguous() {
        let controller = MidiController::with_default_layout();
        let bindings: std::collections::HashSet<_> =
            controller.mappings().iter().map(|m| m.binding).collect();
        assert_eq!(bindings.len(), controller.mappings().len());
        assert_eq!(controller.mappings().len(), 32 + 16 + 8 + 8 + 8);
    }

    #[test]
    fn test_press_and_release() {
        let controller = MidiController::with_default_layout();
        let press = controller.process_message(9, status::NOTE_ON, 86, 127);
        assert_eq!(
            press,
            Some(ControlEvent {
                action: ControlAction::Accent,
                pressed: true
            })
        );
        let release = controller.process_message(9, status::NOTE_ON, 86, 0);
        assert_eq!(release.map(|e| e.pressed), Some(false));
        let off = controller.process_message(9, status::NOTE_OFF, 86, 64);
        assert_eq!(off.map(|e| e.pressed), Some(false));
    }

    #[test]
    fn test_buttons() {
        let controller = MidiController::with_default_layout();
        let action = |note| {
            controller
                .process_message(BUTTON_CHANNEL, status::NOTE_ON, note, 127)
                .map(|e| e.action)
        };
        assert_eq!(action(100), Some(ControlAction::Length(1)));
        assert_eq!(action(107), Some(ControlAction::Length(8)));
        assert_eq!(action(114), Some(ControlAction::BeginCopy(2)));
        assert_eq!(action(119), Some(ControlAction::Paste(3)));
        assert_eq!(action(120), None);
    }

    #[test]
    fn test_add_binding_replaces() {
        let mut controller = MidiController::with_default_layout();
        controller.add_binding(MidiBinding::note(9, 95), ControlAction::ClearPattern);
        let event = controller.process_message(9, status::NOTE_ON, 95, 100);
        assert_eq!(event.map(|e| e.action), Some(ControlAction::ClearPattern));
    }

    #[test]
    fn test_format_binding() {
        assert_eq!(format_binding(&MidiBinding::note(0, 60)), "Ch1 Note C4");
        assert_eq!(format_binding(&MidiBinding::cc(1, 7)), "Ch2 CC 7");
        assert_eq!(format_binding(&MidiBinding::cc_any(1)), "CC 1");
    }
}
