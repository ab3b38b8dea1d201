// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for the step sequencer.
//!
//! This module provides data structures for loading engine settings,
//! velocity tiers, editing options and controller mappings from YAML or
//! TOML files.

pub mod watcher;

pub use watcher::{validate_config, ConfigEvent, ConfigWatcher};

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::control::{ControlAction, GridController, MidiBinding, MidiController};
use crate::sequencer::{
    CopyScope, EngineSettings, GridResolution, PadSelection, Pitch, VelocityMap,
    DEFAULT_PITCH, DEFAULT_RESOLUTION_INDEX, RESOLUTIONS,
};
use crate::timing::TimeSignature;

/// File formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick a format from a file extension. Anything that is not `.toml`
    /// is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    /// Whether a path looks like a config file
    pub fn is_config_path(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml" | "toml")
        )
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    /// Grid geometry and start-up selections
    #[serde(default)]
    pub grid: GridConfig,
    /// Velocity written for each tier
    #[serde(default)]
    pub velocities: VelocityMap,
    /// Editing behavior
    #[serde(default)]
    pub editing: EditingConfig,
    /// Internal transport
    #[serde(default)]
    pub transport: TransportConfig,
    /// Controller mapping overrides on top of the default layout
    #[serde(default)]
    pub controls: Vec<ControlMapping>,
}

impl EngineConfig {
    /// Load a configuration file, YAML or TOML by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => Self::from_yaml(&contents),
            ConfigFormat::Toml => Self::from_toml(&contents),
        }
        .with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration to TOML")
    }

    /// Save to a file, YAML or TOML by extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => self.to_yaml()?,
            ConfigFormat::Toml => self.to_toml()?,
        };
        fs::write(path, text).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Check value ranges and action names
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.width == 0 {
            bail!("grid.width must be at least 1");
        }
        if !(1..=16).contains(&grid.beats_per_bar) {
            bail!("grid.beats_per_bar must be 1..=16, got {}", grid.beats_per_bar);
        }
        if GridResolution::from_label(&grid.resolution).is_none() {
            let labels: Vec<&str> = RESOLUTIONS.iter().map(|r| r.label).collect();
            bail!(
                "unknown grid.resolution '{}' (expected one of {})",
                grid.resolution,
                labels.join(", ")
            );
        }
        if grid.pitch > 127 {
            bail!("grid.pitch must be 0..=127, got {}", grid.pitch);
        }

        let v = &self.velocities;
        if !v.is_valid() {
            bail!(
                "velocities must be 1..=127 with soft < normal < accent, got {}/{}/{}",
                v.soft,
                v.normal,
                v.accent
            );
        }

        if !(20.0..=300.0).contains(&self.transport.tempo) {
            bail!("transport.tempo must be 20..=300, got {}", self.transport.tempo);
        }

        for (i, mapping) in self.controls.iter().enumerate() {
            mapping
                .resolve()
                .with_context(|| format!("controls[{}]", i))?;
        }
        Ok(())
    }

    /// Engine settings described by this configuration
    pub fn to_settings(&self) -> EngineSettings {
        let default_resolution = GridResolution::from_label(&self.grid.resolution)
            .map(|r| r.index())
            .unwrap_or(DEFAULT_RESOLUTION_INDEX);
        EngineSettings {
            width_steps: self.grid.width,
            signature: TimeSignature::new(self.grid.beats_per_bar),
            velocities: self.velocities,
            copy_scope: self.editing.copy_scope,
            velocity_aware_toggle: self.editing.velocity_aware_toggle,
            auto_extend_length: self.editing.auto_extend_length,
            auto_contract_length: self.editing.auto_contract_length,
            default_resolution,
            default_pitch: self.grid.pitch,
        }
    }

    /// Default pad layout with this configuration's overrides applied
    pub fn build_midi_map(&self) -> Result<MidiController> {
        let mut midi = MidiController::with_default_layout();
        for mapping in &self.controls {
            let (binding, action) = mapping.resolve()?;
            midi.add_binding(binding, action);
        }
        Ok(midi)
    }

    /// Grid controller sharing `pads` with the engine
    pub fn build_controller(&self, pads: PadSelection) -> Result<GridController> {
        Ok(GridController::with_mappings(self.build_midi_map()?, pads))
    }
}

/// Grid geometry and start-up selections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Number of step pads
    #[serde(default = "default_width")]
    pub width: usize,
    /// Time signature numerator
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u8,
    /// Resolution label selected at start (e.g. "1/16", "1/8t")
    #[serde(default = "default_resolution")]
    pub resolution: String,
    /// Pitch edited at start
    #[serde(default = "default_pitch")]
    pub pitch: Pitch,
}

fn default_width() -> usize {
    32
}
fn default_beats_per_bar() -> u8 {
    4
}
fn default_resolution() -> String {
    RESOLUTIONS[DEFAULT_RESOLUTION_INDEX].label.to_string()
}
fn default_pitch() -> Pitch {
    DEFAULT_PITCH
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            beats_per_bar: default_beats_per_bar(),
            resolution: default_resolution(),
            pitch: default_pitch(),
        }
    }
}

/// Editing behavior
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EditingConfig {
    /// What a copy captures
    #[serde(default)]
    pub copy_scope: CopyScope,
    /// Re-toggling with a different tier updates instead of removing
    #[serde(default)]
    pub velocity_aware_toggle: bool,
    /// Grow the loop to fit steps written past its end
    #[serde(default)]
    pub auto_extend_length: bool,
    /// Trim trailing empty bars after removals
    #[serde(default)]
    pub auto_contract_length: bool,
}

/// Internal transport settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
}

fn default_tempo() -> f64 {
    120.0
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
        }
    }
}

/// A single controller mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlMapping {
    /// MIDI note number (for buttons and pads)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,
    /// MIDI CC number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<u8>,
    /// MIDI channel 0-15 (any channel when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// Action name, e.g. `bar_lock` or `paste:2`
    pub action: String,
}

impl ControlMapping {
    /// Binding and parsed action
    pub fn resolve(&self) -> Result<(MidiBinding, ControlAction)> {
        if let Some(ch) = self.channel {
            if ch > 15 {
                bail!("channel must be 0..=15, got {}", ch);
            }
        }
        let binding = match (self.note, self.cc, self.channel) {
            (Some(note), None, Some(ch)) => MidiBinding::note(ch, note),
            (Some(note), None, None) => MidiBinding::note_any(note),
            (None, Some(cc), Some(ch)) => MidiBinding::cc(ch, cc),
            (None, Some(cc), None) => MidiBinding::cc_any(cc),
            _ => bail!("mapping needs exactly one of note or cc"),
        };
        if binding.data1 > 127 {
            bail!("note/cc number must be 0..=127, got {}", binding.data1);
        }
        let action: ControlAction = self.action.parse()?;
        Ok((binding, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::midi_map::status;
    use crate::sequencer::{Direction, Intent, VelocityTier};

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
grid:
  width: 16
  resolution: "1/8t"
  pitch: 38

velocities:
  soft: 40
  accent: 120

editing:
  copy_scope: all_pitches
  velocity_aware_toggle: true

controls:
  - note: 95
    channel: 9
    action: clear_pattern
  - cc: 20
    action: page_next
"#;

        let config = EngineConfig::from_yaml(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.grid.width, 16);
        assert_eq!(config.grid.beats_per_bar, 4);
        assert_eq!(config.velocities.soft, 40);
        assert_eq!(config.velocities.normal, 100);
        assert_eq!(config.editing.copy_scope, CopyScope::AllPitches);
        assert_eq!(config.controls.len(), 2);

        let settings = config.to_settings();
        assert_eq!(settings.width_steps, 16);
        assert_eq!(settings.default_resolution, 4);
        assert_eq!(settings.default_pitch, 38);
        assert!(settings.velocity_aware_toggle);
        assert!(!settings.auto_extend_length);
    }

    #[test]
    fn test_parse_toml_config() {
        let text = r#"
[grid]
width = 32
beats_per_bar = 3

[editing]
auto_extend_length = true

[[controls]]
note = 100
channel = 0
action = "length:4"
"#;

        let config = EngineConfig::from_toml(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.to_settings().signature.ticks_per_bar(), 288);
        assert!(config.editing.auto_extend_length);
        assert_eq!(config.controls[0].action, "length:4");
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.to_settings(), EngineSettings::default());
        assert_eq!(config.transport.tempo, 120.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.grid.resolution = "1/64".into();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.velocities.soft = 110;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.grid.width = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.controls.push(ControlMapping {
            note: Some(60),
            cc: Some(1),
            channel: None,
            action: "bar_lock".into(),
        });
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.controls.push(ControlMapping {
            note: Some(60),
            cc: None,
            channel: None,
            action: "launch_scene".into(),
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("controls[0]"));
    }

    #[test]
    fn test_controls_override_default_layout() {
        let config = EngineConfig {
            controls: vec![ControlMapping {
                note: Some(94),
                cc: None,
                channel: Some(9),
                action: "resolution_prev".into(),
            }],
            ..EngineConfig::default()
        };
        let mut controller = config.build_controller(PadSelection::default()).unwrap();
        assert_eq!(
            controller.process_midi(9, status::NOTE_ON, 94, 127),
            Some(Intent::CycleResolution(Direction::Previous))
        );
        // Untouched defaults remain
        assert_eq!(
            controller.process_midi(9, status::NOTE_ON, 87, 127),
            Some(Intent::SetVelocityTier(VelocityTier::Soft))
        );
    }

    #[test]
    fn test_round_trip_yaml() {
        let mut original = EngineConfig::default();
        original.grid.width = 24;
        original.editing.auto_contract_length = true;
        original.controls.push(ControlMapping {
            note: Some(36),
            cc: None,
            channel: Some(9),
            action: "clear_bar:1".into(),
        });

        let yaml = original.to_yaml().unwrap();
        let parsed = EngineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a")), ConfigFormat::Yaml);
        assert!(ConfigFormat::is_config_path(Path::new("x/grid.yaml")));
        assert!(!ConfigFormat::is_config_path(Path::new("x/grid.txt")));
    }
}
