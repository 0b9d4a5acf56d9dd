//! Tunable engine constants

use super::{ConfigError, load_toml, parse_toml};
use crate::registry::DotFlavor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants shared by every container built from them
///
/// Unlike the template registry these are plain numbers, so containers take
/// them as an `Arc<StatusConstants>` and tests can build isolated sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConstants {
    #[serde(default)]
    pub resistance: ResistanceConstants,
    #[serde(default)]
    pub dot: DotConstants,
    /// Maximum nesting of `apply_effect` chains
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,
}

impl StatusConstants {
    /// Load constants from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    /// Parse constants from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        parse_toml(content, "<constants>")
    }
}

impl Default for StatusConstants {
    fn default() -> Self {
        StatusConstants {
            resistance: ResistanceConstants::default(),
            dot: DotConstants::default(),
            max_chain_depth: default_max_chain_depth(),
        }
    }
}

fn default_max_chain_depth() -> u32 {
    3
}

/// Resistance roll tuning
///
/// hit = clamp(hit_base + potency * hit_per_potency
///             + (attacker_wp - defender_wp) * hit_per_willpower, hit_min, hit_max)
/// ceiling = clamp(resist_base + defender_wp * resist_per_willpower, 0, resist_max)
/// resist = clamp(ceiling * (1 - hit), 0, 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceConstants {
    #[serde(default = "default_hit_base")]
    pub hit_base: f64,
    #[serde(default = "default_hit_per_potency")]
    pub hit_per_potency: f64,
    #[serde(default = "default_hit_per_willpower")]
    pub hit_per_willpower: f64,
    #[serde(default = "default_hit_min")]
    pub hit_min: f64,
    #[serde(default = "default_hit_max")]
    pub hit_max: f64,
    #[serde(default = "default_resist_base")]
    pub resist_base: f64,
    #[serde(default = "default_resist_per_willpower")]
    pub resist_per_willpower: f64,
    #[serde(default = "default_resist_max")]
    pub resist_max: f64,
}

impl Default for ResistanceConstants {
    fn default() -> Self {
        ResistanceConstants {
            hit_base: default_hit_base(),
            hit_per_potency: default_hit_per_potency(),
            hit_per_willpower: default_hit_per_willpower(),
            hit_min: default_hit_min(),
            hit_max: default_hit_max(),
            resist_base: default_resist_base(),
            resist_per_willpower: default_resist_per_willpower(),
            resist_max: default_resist_max(),
        }
    }
}

fn default_hit_base() -> f64 {
    0.3
}
fn default_hit_per_potency() -> f64 {
    0.1
}
fn default_hit_per_willpower() -> f64 {
    0.002
}
fn default_hit_min() -> f64 {
    0.2
}
fn default_hit_max() -> f64 {
    0.8
}
fn default_resist_base() -> f64 {
    0.2
}
fn default_resist_per_willpower() -> f64 {
    0.005
}
fn default_resist_max() -> f64 {
    0.7
}

/// Health and spirit weighting for one DoT flavor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DotRatios {
    /// Fraction of the target's health baseline dealt per tick
    pub health_ratio: f64,
    /// Fraction of the caster's captured spirit dealt per tick
    pub spirit_ratio: f64,
}

/// Damage-over-time tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotConstants {
    /// Health baseline = target vitality * health_per_vitality
    #[serde(default = "default_health_per_vitality")]
    pub health_per_vitality: f64,
    #[serde(default = "default_burn")]
    pub burn: DotRatios,
    #[serde(default = "default_bleed")]
    pub bleed: DotRatios,
    #[serde(default = "default_poison")]
    pub poison: DotRatios,
    #[serde(default = "default_generic")]
    pub generic: DotRatios,
}

impl DotConstants {
    pub fn ratios(&self, flavor: DotFlavor) -> DotRatios {
        match flavor {
            DotFlavor::Burn => self.burn,
            DotFlavor::Bleed => self.bleed,
            DotFlavor::Poison => self.poison,
            DotFlavor::Generic => self.generic,
        }
    }
}

impl Default for DotConstants {
    fn default() -> Self {
        DotConstants {
            health_per_vitality: default_health_per_vitality(),
            burn: default_burn(),
            bleed: default_bleed(),
            poison: default_poison(),
            generic: default_generic(),
        }
    }
}

fn default_health_per_vitality() -> f64 {
    10.0
}
fn default_burn() -> DotRatios {
    DotRatios {
        health_ratio: 0.03,
        spirit_ratio: 0.2,
    }
}
fn default_bleed() -> DotRatios {
    DotRatios {
        health_ratio: 0.01,
        spirit_ratio: 0.4,
    }
}
fn default_poison() -> DotRatios {
    DotRatios {
        health_ratio: 0.02,
        spirit_ratio: 0.25,
    }
}
fn default_generic() -> DotRatios {
    DotRatios {
        health_ratio: 0.015,
        spirit_ratio: 0.15,
    }
}
