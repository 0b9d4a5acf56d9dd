use crate::registry::{DotFlavor, EffectCategory, EffectDuration, EffectTag, StackingPolicy};
use serde::{Deserialize, Serialize};
use unit_core::{Attribute, Element, Resource};

/// A sub-effect with every parameter resolved to a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubEffect {
    Damage {
        element: Element,
        amount: f64,
    },
    Heal {
        amount: f64,
    },
    StatModifier {
        attribute: Attribute,
        flat: f64,
        percent: f64,
    },
    ResourceModifier {
        resource: Resource,
        flat: f64,
        percent: f64,
    },
    ElementAmplify {
        element: Element,
        bonus: f64,
    },
    HealingModifier {
        bonus: f64,
    },
    Shield {
        amount: f64,
    },
    DamageOverTime {
        flavor: DotFlavor,
        element: Element,
        scale: f64,
    },
    HealOverTime {
        amount: f64,
        percent: f64,
    },
    ActionBlock {
        blocks_action: bool,
        blocks_skill: bool,
        blocks_dodge: bool,
    },
    ApplyEffect {
        effect: String,
        chance: f64,
    },
}

/// Fully numeric effect, produced by [`crate::materialize::materialize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub key: String,
    pub name: String,
    /// Placeholders substituted; empty when the template has none
    pub description: String,
    pub max_stacks: u32,
    pub duration: EffectDuration,
    pub stacking: StackingPolicy,
    pub category: EffectCategory,
    pub tags: Vec<EffectTag>,
    pub conflicts_with: Vec<String>,
    pub effects: Vec<SubEffect>,
}

impl EffectConfig {
    pub fn has_tag(&self, tag: EffectTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_hostile(&self) -> bool {
        self.category.is_hostile()
    }

    /// Whether any sub-effect deals damage every tick
    pub fn deals_damage_over_time(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, SubEffect::DamageOverTime { .. }))
    }
}
