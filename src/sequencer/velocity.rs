// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Velocity tiers applied to newly written steps.

use serde::{Deserialize, Serialize};

/// Discrete velocity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTier {
    Soft,
    Normal,
    Accent,
}

impl Default for VelocityTier {
    fn default() -> Self {
        VelocityTier::Normal
    }
}

impl VelocityTier {
    /// Next tier: soft -> normal -> accent -> soft
    pub fn next(self) -> Self {
        match self {
            VelocityTier::Soft => VelocityTier::Normal,
            VelocityTier::Normal => VelocityTier::Accent,
            VelocityTier::Accent => VelocityTier::Soft,
        }
    }

    /// Short name used in logs and the text renderer
    pub fn name(self) -> &'static str {
        match self {
            VelocityTier::Soft => "soft",
            VelocityTier::Normal => "normal",
            VelocityTier::Accent => "accent",
        }
    }
}

/// Numeric MIDI velocity for each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityMap {
    #[serde(default = "default_soft")]
    pub soft: u8,
    #[serde(default = "default_normal")]
    pub normal: u8,
    #[serde(default = "default_accent")]
    pub accent: u8,
}

fn default_soft() -> u8 {
    60
}
fn default_normal() -> u8 {
    100
}
fn default_accent() -> u8 {
    127
}

impl Default for VelocityMap {
    fn default() -> Self {
        Self {
            soft: default_soft(),
            normal: default_normal(),
            accent: default_accent(),
        }
    }
}

impl VelocityMap {
    /// Velocity written for a tier
    pub fn velocity(&self, tier: VelocityTier) -> u8 {
        match tier {
            VelocityTier::Soft => self.soft,
            VelocityTier::Normal => self.normal,
            VelocityTier::Accent => self.accent,
        }
    }

    /// Classify a stored velocity back into a tier.
    ///
    /// Anything at or above the accent velocity reads as accent, anything at
    /// or below the soft velocity reads as soft, the rest is normal.
    pub fn classify(&self, velocity: u8) -> VelocityTier {
        if velocity >= self.accent {
            VelocityTier::Accent
        } else if velocity <= self.soft {
            VelocityTier::Soft
        } else {
            VelocityTier::Normal
        }
    }

    /// Check that soft < normal < accent and all are valid note-on velocities
    pub fn is_valid(&self) -> bool {
        self.soft >= 1 && self.soft < self.normal && self.normal < self.accent && self.accent <= 127
    }
}

/// Modal tier selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSelector {
    tier: VelocityTier,
}

impl TierSelector {
    /// Currently selected tier
    pub fn current(&self) -> VelocityTier {
        self.tier
    }

    /// Advance soft -> normal -> accent -> soft
    pub fn cycle(&mut self) -> VelocityTier {
        self.tier = self.tier.next();
        self.tier
    }

    /// Select a tier directly
    pub fn set(&mut self, tier: VelocityTier) {
        self.tier = tier;
    }
}
