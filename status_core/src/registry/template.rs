//! Effect template definitions - the authored, unscaled form of an effect

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use unit_core::{Attribute, Element, Resource};

/// What happens when an effect is applied to a target that already has it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum StackingPolicy {
    /// Add stacks up to the cap and reset duration
    Stack,
    /// Reset duration only
    #[default]
    Refresh,
    /// Every application is its own instance
    Independent,
}

/// Broad category, drives hostility and tick ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Control,
    Buff,
    Debuff,
    DamageOverTime,
    Persistent,
    Environmental,
}

impl EffectCategory {
    /// Tick processing order, lowest first
    pub fn priority(&self) -> u8 {
        match self {
            EffectCategory::Control => 0,
            EffectCategory::Buff | EffectCategory::Debuff => 1,
            EffectCategory::DamageOverTime => 2,
            EffectCategory::Persistent => 3,
            EffectCategory::Environmental => 4,
        }
    }

    /// Hostile effects go through a resistance roll
    pub fn is_hostile(&self) -> bool {
        matches!(self, EffectCategory::Debuff | EffectCategory::Control)
    }
}

/// Categorical label used for queries and dispels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTag {
    DamageOverTime,
    Buff,
    Debuff,
    Control,
    Persistent,
    Environmental,
    Elemental,
    Healing,
    Shield,
    Cultivation,
}

/// Default lifetime of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectDuration {
    /// Decrements by one per tick
    Turns { value: u32 },
    /// Recomputed from elapsed wall-clock time
    WallClock { millis: i64 },
    /// Never expires on its own
    Permanent,
}

impl EffectDuration {
    pub fn is_permanent(&self) -> bool {
        matches!(self, EffectDuration::Permanent)
    }

    /// Remaining value for a fresh instance (turns or milliseconds)
    pub fn initial_remaining(&self) -> i64 {
        match self {
            EffectDuration::Turns { value } => i64::from(*value),
            EffectDuration::WallClock { millis } => *millis,
            EffectDuration::Permanent => 0,
        }
    }

    /// Same kind with a different length; permanent durations ignore overrides
    pub fn with_override(self, value: Option<i64>) -> Self {
        match (self, value) {
            (EffectDuration::Turns { .. }, Some(v)) => EffectDuration::Turns {
                value: u32::try_from(v.max(0)).unwrap_or(u32::MAX),
            },
            (EffectDuration::WallClock { .. }, Some(v)) => EffectDuration::WallClock { millis: v.max(0) },
            (duration, _) => duration,
        }
    }
}

impl fmt::Display for EffectDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectDuration::Turns { value } => write!(f, "{}回合", value),
            EffectDuration::WallClock { millis } => write!(f, "{}秒", millis / 1000),
            EffectDuration::Permanent => write!(f, "永久"),
        }
    }
}

/// Which formula a damage-over-time effect uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DotFlavor {
    Burn,
    Bleed,
    Poison,
    #[default]
    Generic,
}

/// Named scaling axis of a scalable parameter
///
/// Wire names: `caster_<attribute>`, `quality`, `stacks`, `none`. Anything
/// else is kept as `Unknown` and resolves like `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScalingAxis {
    Caster(Attribute),
    Quality,
    Stacks,
    #[default]
    None,
    Unknown(String),
}

impl ScalingAxis {
    pub fn parse(name: &str) -> Self {
        match name {
            "quality" => ScalingAxis::Quality,
            "stacks" => ScalingAxis::Stacks,
            "none" | "" => ScalingAxis::None,
            other => other
                .strip_prefix("caster_")
                .and_then(|attr| attr.parse::<Attribute>().ok())
                .map(ScalingAxis::Caster)
                .unwrap_or_else(|| ScalingAxis::Unknown(other.to_string())),
        }
    }
}

impl From<String> for ScalingAxis {
    fn from(name: String) -> Self {
        ScalingAxis::parse(&name)
    }
}

impl From<ScalingAxis> for String {
    fn from(axis: ScalingAxis) -> Self {
        match axis {
            ScalingAxis::Caster(attr) => format!("caster_{}", attr.as_str()),
            ScalingAxis::Quality => "quality".to_string(),
            ScalingAxis::Stacks => "stacks".to_string(),
            ScalingAxis::None => "none".to_string(),
            ScalingAxis::Unknown(name) => name,
        }
    }
}

fn default_coefficient() -> f64 {
    1.0
}

/// A template parameter: a literal number or a scalable formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Literal(f64),
    Scalable {
        base: f64,
        #[serde(default)]
        scaling: ScalingAxis,
        #[serde(default = "default_coefficient")]
        coefficient: f64,
    },
}

impl ParamValue {
    pub fn scalable(base: f64, scaling: ScalingAxis, coefficient: f64) -> Self {
        ParamValue::Scalable {
            base,
            scaling,
            coefficient,
        }
    }

    pub fn base(&self) -> f64 {
        match self {
            ParamValue::Literal(v) => *v,
            ParamValue::Scalable { base, .. } => *base,
        }
    }

    /// Replace the base while keeping the scaling behaviour
    pub fn with_base(&self, new_base: f64) -> Self {
        match self {
            ParamValue::Literal(_) => ParamValue::Literal(new_base),
            ParamValue::Scalable {
                scaling,
                coefficient,
                ..
            } => ParamValue::Scalable {
                base: new_base,
                scaling: scaling.clone(),
                coefficient: *coefficient,
            },
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Literal(v)
    }
}

/// Closed set of sub-effect types, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubEffectKind {
    /// Instant damage on application (params: amount)
    Damage {
        #[serde(default)]
        element: Element,
    },
    /// Instant heal on application (params: amount)
    Heal,
    /// params: flat, percent (of the target's base attribute)
    StatModifier { attribute: Attribute },
    /// params: flat, percent (of the target's max pool)
    ResourceModifier { resource: Resource },
    /// params: bonus (added to the element damage multiplier)
    ElementAmplify { element: Element },
    /// params: bonus (added to the healing multiplier, negative reduces)
    HealingModifier,
    /// params: amount
    Shield,
    /// params: scale
    DamageOverTime {
        #[serde(default)]
        flavor: DotFlavor,
        #[serde(default)]
        element: Element,
    },
    /// params: amount, percent (of the target's max hp)
    HealOverTime,
    ActionBlock {
        #[serde(default)]
        blocks_action: bool,
        #[serde(default)]
        blocks_skill: bool,
        #[serde(default)]
        blocks_dodge: bool,
    },
    /// params: chance
    ApplyEffect { effect: String },
}

/// One parametrized component of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEffectTemplate {
    #[serde(flatten)]
    pub kind: SubEffectKind,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl SubEffectTemplate {
    pub fn new(kind: SubEffectKind) -> Self {
        SubEffectTemplate {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

fn default_max_stacks() -> u32 {
    1
}

/// Author-defined effect definition, registered once and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub key: String,
    pub name: String,
    /// Description with `{param}` placeholders
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    pub duration: EffectDuration,
    #[serde(default)]
    pub stacking: StackingPolicy,
    pub category: EffectCategory,
    #[serde(default)]
    pub tags: Vec<EffectTag>,
    /// Keys of effects that cannot coexist with this one
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    #[serde(default)]
    pub effects: Vec<SubEffectTemplate>,
}

impl EffectTemplate {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        category: EffectCategory,
        duration: EffectDuration,
    ) -> Self {
        EffectTemplate {
            key: key.into(),
            name: name.into(),
            description: None,
            max_stacks: 1,
            duration,
            stacking: StackingPolicy::default(),
            category,
            tags: Vec::new(),
            conflicts_with: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_stacking(mut self, stacking: StackingPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_tag(mut self, tag: EffectTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_conflict(mut self, key: impl Into<String>) -> Self {
        self.conflicts_with.push(key.into());
        self
    }

    pub fn with_effect(mut self, effect: SubEffectTemplate) -> Self {
        self.effects.push(effect);
        self
    }

    /// Stack cap, never below one
    pub fn stack_cap(&self) -> u32 {
        self.max_stacks.max(1)
    }

    pub fn has_tag(&self, tag: EffectTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn conflicts_with_key(&self, key: &str) -> bool {
        self.conflicts_with.iter().any(|k| k == key)
    }

    pub fn is_hostile(&self) -> bool {
        self.category.is_hostile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_axis_wire_names() {
        assert_eq!(ScalingAxis::parse("caster_spirit"), ScalingAxis::Caster(Attribute::Spirit));
        assert_eq!(ScalingAxis::parse("quality"), ScalingAxis::Quality);
        assert_eq!(ScalingAxis::parse("stacks"), ScalingAxis::Stacks);
        assert_eq!(ScalingAxis::parse("none"), ScalingAxis::None);
        assert_eq!(
            ScalingAxis::parse("caster_luck"),
            ScalingAxis::Unknown("caster_luck".to_string())
        );
        assert_eq!(String::from(ScalingAxis::Caster(Attribute::Willpower)), "caster_willpower");
    }

    #[test]
    fn test_unknown_axis_round_trips() {
        let value: ParamValue =
            serde_json::from_str(r#"{"base": 4.0, "scaling": "moon_phase", "coefficient": 2.0}"#).unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("moon_phase"));
    }

    #[test]
    fn test_param_value_literal_or_scalable() {
        let literal: ParamValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(literal, ParamValue::Literal(12.5));

        let scalable: ParamValue = serde_json::from_str(r#"{"base": 10.0, "scaling": "stacks"}"#).unwrap();
        assert_eq!(scalable, ParamValue::scalable(10.0, ScalingAxis::Stacks, 1.0));
    }

    #[test]
    fn test_with_base_keeps_scaling() {
        let value = ParamValue::scalable(5.0, ScalingAxis::Caster(Attribute::Spirit), 0.5);
        let replaced = value.with_base(9.0);
        assert_eq!(replaced, ParamValue::scalable(9.0, ScalingAxis::Caster(Attribute::Spirit), 0.5));
    }

    #[test]
    fn test_duration_override() {
        let turns = EffectDuration::Turns { value: 3 };
        assert_eq!(turns.with_override(Some(5)), EffectDuration::Turns { value: 5 });
        assert_eq!(turns.with_override(None), turns);
        assert_eq!(EffectDuration::Permanent.with_override(Some(5)), EffectDuration::Permanent);
        assert_eq!(
            EffectDuration::WallClock { millis: 1000 }.with_override(Some(-20)),
            EffectDuration::WallClock { millis: 0 }
        );
    }

    #[test]
    fn test_category_priority_order() {
        assert!(EffectCategory::Control.priority() < EffectCategory::Buff.priority());
        assert_eq!(EffectCategory::Buff.priority(), EffectCategory::Debuff.priority());
        assert!(EffectCategory::Debuff.priority() < EffectCategory::DamageOverTime.priority());
        assert!(EffectCategory::DamageOverTime.priority() < EffectCategory::Persistent.priority());
        assert!(EffectCategory::Persistent.priority() < EffectCategory::Environmental.priority());
    }

    #[test]
    fn test_sub_effect_wire_format() {
        let json = r#"{"type": "damage_over_time", "flavor": "burn", "element": "fire", "params": {"scale": 1.5}}"#;
        let sub: SubEffectTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(
            sub.kind,
            SubEffectKind::DamageOverTime {
                flavor: DotFlavor::Burn,
                element: Element::Fire
            }
        );
        assert_eq!(sub.params.get("scale"), Some(&ParamValue::Literal(1.5)));
    }

    #[test]
    fn test_stack_cap_never_zero() {
        let template = EffectTemplate::new(
            "odd",
            "Odd",
            EffectCategory::Buff,
            EffectDuration::Turns { value: 1 },
        )
        .with_max_stacks(0);
        assert_eq!(template.stack_cap(), 1);
    }
}
