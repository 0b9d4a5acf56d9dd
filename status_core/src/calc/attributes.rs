//! Attribute modification - what active effects do to a unit's numbers
//!
//! Per sub-effect:
//! - stat_modifier:     flat + target_base_attribute * percent * potency
//! - resource_modifier: flat + target_max_pool * percent * potency
//! - element_amplify:   bonus * potency added to the element multiplier
//! - healing_modifier:  bonus * potency added to the healing multiplier
//! - shield:            amount
//!
//! Every other sub-effect contributes nothing.

use crate::materialize::{EffectConfig, SubEffect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unit_core::{Attribute, Element, Resource, UnitSnapshot};

/// Additive deltas from active effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeModification {
    pub attributes: BTreeMap<Attribute, f64>,
    pub max_hp: f64,
    pub max_mp: f64,
    /// Added to the element's damage multiplier (base 1.0)
    pub element_damage: BTreeMap<Element, f64>,
    /// Added to the healing multiplier (base 1.0)
    pub healing_multiplier: f64,
    pub shield: f64,
}

impl AttributeModification {
    pub fn new() -> Self {
        AttributeModification::default()
    }

    pub fn attribute(&self, attribute: Attribute) -> f64 {
        self.attributes.get(&attribute).copied().unwrap_or(0.0)
    }

    pub fn add_attribute(&mut self, attribute: Attribute, delta: f64) {
        *self.attributes.entry(attribute).or_insert(0.0) += delta;
    }

    /// Final damage multiplier for an element (1.0 + bonuses)
    pub fn element_multiplier(&self, element: Element) -> f64 {
        1.0 + self.element_damage.get(&element).copied().unwrap_or(0.0)
    }

    /// Final healing effectiveness, never negative
    pub fn healing_factor(&self) -> f64 {
        (1.0 + self.healing_multiplier).max(0.0)
    }

    /// Sum another modification into this one
    pub fn merge(&mut self, other: &AttributeModification) {
        for (attribute, delta) in &other.attributes {
            self.add_attribute(*attribute, *delta);
        }
        for (element, bonus) in &other.element_damage {
            *self.element_damage.entry(*element).or_insert(0.0) += bonus;
        }
        self.max_hp += other.max_hp;
        self.max_mp += other.max_mp;
        self.healing_multiplier += other.healing_multiplier;
        self.shield += other.shield;
    }

    pub fn is_empty(&self) -> bool {
        *self == AttributeModification::default()
    }
}

/// Compute the modification one effect contributes to a target
pub fn calculate_attribute_modification(
    config: &EffectConfig,
    potency: f64,
    target: &UnitSnapshot,
) -> AttributeModification {
    let mut modification = AttributeModification::new();

    for effect in &config.effects {
        match effect {
            SubEffect::StatModifier {
                attribute,
                flat,
                percent,
            } => {
                let delta = flat + target.attribute(*attribute) * percent * potency;
                modification.add_attribute(*attribute, delta);
            }
            SubEffect::ResourceModifier {
                resource,
                flat,
                percent,
            } => match resource {
                Resource::Hp => modification.max_hp += flat + target.max_hp * percent * potency,
                Resource::Mp => modification.max_mp += flat + target.max_mp * percent * potency,
            },
            SubEffect::ElementAmplify { element, bonus } => {
                *modification.element_damage.entry(*element).or_insert(0.0) += bonus * potency;
            }
            SubEffect::HealingModifier { bonus } => {
                modification.healing_multiplier += bonus * potency;
            }
            SubEffect::Shield { amount } => modification.shield += amount,
            _ => {}
        }
    }

    modification
}
