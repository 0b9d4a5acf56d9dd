//! Point-in-time views of combatants
//!
//! Snapshots are plain values. Effects capture a `CasterSnapshot` once at
//! application time and never hold a live reference to the caster.

use crate::types::{Attribute, Attributes, Element};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The subset of a caster needed by effect calculators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasterSnapshot {
    pub unit_id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Elemental damage multipliers (missing element = 1.0)
    #[serde(default)]
    pub element_multipliers: BTreeMap<Element, f64>,
}

impl CasterSnapshot {
    pub fn new(unit_id: impl Into<String>, name: impl Into<String>) -> Self {
        CasterSnapshot {
            unit_id: unit_id.into(),
            name: name.into(),
            attributes: Attributes::default(),
            element_multipliers: BTreeMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute, value: f64) -> Self {
        self.attributes.set(attribute, value);
        self
    }

    pub fn with_element_multiplier(mut self, element: Element, multiplier: f64) -> Self {
        self.element_multipliers.insert(element, multiplier);
        self
    }

    pub fn attribute(&self, attribute: Attribute) -> f64 {
        self.attributes.get(attribute)
    }

    pub fn element_multiplier(&self, element: Element) -> f64 {
        self.element_multipliers.get(&element).copied().unwrap_or(1.0)
    }
}

/// Target context supplied by the caller on every call that needs it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub unit_id: String,
    pub name: String,
    pub current_hp: f64,
    pub current_mp: f64,
    pub max_hp: f64,
    pub max_mp: f64,
    #[serde(default)]
    pub base_attributes: Attributes,
}

impl UnitSnapshot {
    /// Create a unit at full resources
    pub fn new(unit_id: impl Into<String>, name: impl Into<String>, max_hp: f64, max_mp: f64) -> Self {
        UnitSnapshot {
            unit_id: unit_id.into(),
            name: name.into(),
            current_hp: max_hp,
            current_mp: max_mp,
            max_hp,
            max_mp,
            base_attributes: Attributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.base_attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute, value: f64) -> Self {
        self.base_attributes.set(attribute, value);
        self
    }

    pub fn attribute(&self, attribute: Attribute) -> f64 {
        self.base_attributes.get(attribute)
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    /// Current health as a percentage of max (0 when max is 0)
    pub fn hp_percent(&self) -> f64 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.current_hp / self.max_hp * 100.0).clamp(0.0, 100.0)
    }

    /// Capture this unit as a caster (used for self-applied effects)
    pub fn to_caster(&self) -> CasterSnapshot {
        CasterSnapshot {
            unit_id: self.unit_id.clone(),
            name: self.name.clone(),
            attributes: self.base_attributes,
            element_multipliers: BTreeMap::new(),
        }
    }
}
