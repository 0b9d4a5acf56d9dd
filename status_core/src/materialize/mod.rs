//! Materializer - template + context into a concrete effect configuration
//!
//! Scaling rules per axis:
//! - `caster_<attr>`: base + coefficient * caster attribute (missing caster = 0)
//! - `quality`:       base * quality multiplier (missing tier = 1.0)
//! - `stacks`:        base * coefficient * stacks (missing stacks = 1)
//! - `none`:          base
//!
//! Unknown axes resolve like `none`. A malformed template degrades instead of
//! failing combat resolution.

mod config;
mod context;

pub use config::{EffectConfig, SubEffect};
pub use context::{MaterializationContext, ParamOverrides};

use crate::registry::{EffectTemplate, ParamValue, ScalingAxis, SubEffectKind, SubEffectTemplate};
use std::collections::BTreeMap;

/// Resolve a template against a context
pub fn materialize(template: &EffectTemplate, ctx: &MaterializationContext) -> EffectConfig {
    // First sub-effect to define a name wins the description placeholder
    let mut named: BTreeMap<String, f64> = BTreeMap::new();

    let effects = template
        .effects
        .iter()
        .enumerate()
        .map(|(index, sub)| {
            let params = resolve_params(sub, ctx.overrides.get(&index), ctx);
            for (name, value) in &params {
                named.entry(name.clone()).or_insert(*value);
            }
            build_sub_effect(&sub.kind, &params)
        })
        .collect();

    named
        .entry("stacks".to_string())
        .or_insert(f64::from(ctx.stack_count()));

    let mut description = template
        .description
        .as_deref()
        .map(|text| render_description(text, &named))
        .unwrap_or_default();
    if description.contains("{duration}") {
        description = description.replace("{duration}", &template.duration.to_string());
    }

    EffectConfig {
        key: template.key.clone(),
        name: template.name.clone(),
        description,
        max_stacks: template.stack_cap(),
        duration: template.duration,
        stacking: template.stacking,
        category: template.category,
        tags: template.tags.clone(),
        conflicts_with: template.conflicts_with.clone(),
        effects,
    }
}

/// Resolve a single parameter value
pub fn resolve_value(value: &ParamValue, ctx: &MaterializationContext) -> f64 {
    match value {
        ParamValue::Literal(v) => *v,
        ParamValue::Scalable {
            base,
            scaling,
            coefficient,
        } => match scaling {
            ScalingAxis::Caster(attribute) => {
                let stat = ctx
                    .caster
                    .as_ref()
                    .map(|c| c.attribute(*attribute))
                    .unwrap_or(0.0);
                base + coefficient * stat
            }
            ScalingAxis::Quality => base * ctx.quality.map(|q| q.multiplier()).unwrap_or(1.0),
            ScalingAxis::Stacks => base * coefficient * f64::from(ctx.stack_count()),
            ScalingAxis::None => *base,
            ScalingAxis::Unknown(name) => {
                tracing::warn!("Unknown scaling axis '{}', using base value {}", name, base);
                *base
            }
        },
    }
}

/// Apply overrides to the raw parameters, then resolve every one
fn resolve_params(
    sub: &SubEffectTemplate,
    overrides: Option<&BTreeMap<String, f64>>,
    ctx: &MaterializationContext,
) -> BTreeMap<String, f64> {
    let mut params = sub.params.clone();
    if let Some(overrides) = overrides {
        for (name, value) in overrides {
            let replaced = match params.get(name) {
                Some(existing) => existing.with_base(*value),
                None => ParamValue::Literal(*value),
            };
            params.insert(name.clone(), replaced);
        }
    }

    params
        .iter()
        .map(|(name, value)| (name.clone(), resolve_value(value, ctx)))
        .collect()
}

fn build_sub_effect(kind: &SubEffectKind, params: &BTreeMap<String, f64>) -> SubEffect {
    let get = |name: &str, default: f64| params.get(name).copied().unwrap_or(default);

    match kind {
        SubEffectKind::Damage { element } => SubEffect::Damage {
            element: *element,
            amount: get("amount", 0.0),
        },
        SubEffectKind::Heal => SubEffect::Heal {
            amount: get("amount", 0.0),
        },
        SubEffectKind::StatModifier { attribute } => SubEffect::StatModifier {
            attribute: *attribute,
            flat: get("flat", 0.0),
            percent: get("percent", 0.0),
        },
        SubEffectKind::ResourceModifier { resource } => SubEffect::ResourceModifier {
            resource: *resource,
            flat: get("flat", 0.0),
            percent: get("percent", 0.0),
        },
        SubEffectKind::ElementAmplify { element } => SubEffect::ElementAmplify {
            element: *element,
            bonus: get("bonus", 0.0),
        },
        SubEffectKind::HealingModifier => SubEffect::HealingModifier {
            bonus: get("bonus", 0.0),
        },
        SubEffectKind::Shield => SubEffect::Shield {
            amount: get("amount", 0.0),
        },
        SubEffectKind::DamageOverTime { flavor, element } => SubEffect::DamageOverTime {
            flavor: *flavor,
            element: *element,
            scale: get("scale", 1.0),
        },
        SubEffectKind::HealOverTime => SubEffect::HealOverTime {
            amount: get("amount", 0.0),
            percent: get("percent", 0.0),
        },
        SubEffectKind::ActionBlock {
            blocks_action,
            blocks_skill,
            blocks_dodge,
        } => SubEffect::ActionBlock {
            blocks_action: *blocks_action,
            blocks_skill: *blocks_skill,
            blocks_dodge: *blocks_dodge,
        },
        SubEffectKind::ApplyEffect { effect } => SubEffect::ApplyEffect {
            effect: effect.clone(),
            chance: get("chance", 1.0),
        },
    }
}

/// Substitute `{name}` placeholders; unknown placeholders stay verbatim
pub fn render_description(text: &str, values: &BTreeMap<String, f64>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match values.get(name) {
                    Some(value) => out.push_str(&format_value(*value)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DotFlavor, EffectCategory, EffectDuration};
    use proptest::prelude::*;
    use unit_core::{Attribute, CasterSnapshot, Element, QualityTier};

    fn spirit_template(base: f64, coefficient: f64) -> EffectTemplate {
        EffectTemplate::new(
            "surge",
            "Surge",
            EffectCategory::Buff,
            EffectDuration::Turns { value: 2 },
        )
        .with_description("Spirit +{flat}")
        .with_effect(
            SubEffectTemplate::new(SubEffectKind::StatModifier {
                attribute: Attribute::Spirit,
            })
            .with_param(
                "flat",
                ParamValue::scalable(base, ScalingAxis::Caster(Attribute::Spirit), coefficient),
            ),
        )
    }

    fn caster_with_spirit(spirit: f64) -> CasterSnapshot {
        CasterSnapshot::new("c1", "Elder").with_attribute(Attribute::Spirit, spirit)
    }

    fn flat_of(config: &EffectConfig) -> f64 {
        match &config.effects[0] {
            SubEffect::StatModifier { flat, .. } => *flat,
            other => panic!("Expected stat modifier, got {:?}", other),
        }
    }

    #[test]
    fn test_caster_scaling_is_linear() {
        let template = spirit_template(0.0, 0.5);
        let low = materialize(&template, &MaterializationContext::new().with_caster(caster_with_spirit(50.0)));
        let high = materialize(&template, &MaterializationContext::new().with_caster(caster_with_spirit(200.0)));

        assert!(flat_of(&high) > flat_of(&low));
        // No fixed offset: 200 / 50 = exactly 4x
        assert!((flat_of(&high) / flat_of(&low) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_caster_defaults_to_zero() {
        let template = spirit_template(7.0, 0.5);
        let config = materialize(&template, &MaterializationContext::new());
        assert!((flat_of(&config) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quality_scaling() {
        let value = ParamValue::scalable(10.0, ScalingAxis::Quality, 1.0);
        let common = resolve_value(&value, &MaterializationContext::new());
        let heaven = resolve_value(&value, &MaterializationContext::new().with_quality(QualityTier::Heaven));
        assert!((common - 10.0).abs() < f64::EPSILON);
        assert!((heaven - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stack_scaling_defaults_to_one() {
        let value = ParamValue::scalable(4.0, ScalingAxis::Stacks, 1.5);
        let single = resolve_value(&value, &MaterializationContext::new());
        let triple = resolve_value(&value, &MaterializationContext::new().with_stacks(3));
        assert!((single - 6.0).abs() < f64::EPSILON);
        assert!((triple - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_none_axis_ignores_context() {
        let value = ParamValue::scalable(3.0, ScalingAxis::None, 100.0);
        let ctx = MaterializationContext::new()
            .with_caster(caster_with_spirit(999.0))
            .with_quality(QualityTier::Divine)
            .with_stacks(9);
        assert!((resolve_value(&value, &ctx) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_axis_degrades_to_base_idempotently() {
        let value = ParamValue::scalable(11.0, ScalingAxis::parse("phase_of_moon"), 3.0);
        let ctx = MaterializationContext::new().with_caster(caster_with_spirit(80.0));
        let first = resolve_value(&value, &ctx);
        let second = resolve_value(&value, &ctx);
        assert!((first - 11.0).abs() < f64::EPSILON);
        assert!((first - second).abs() < f64::EPSILON);
    }

    #[test]
    fn test_override_replaces_base_but_keeps_scaling() {
        let template = spirit_template(5.0, 0.5);
        let ctx = MaterializationContext::new()
            .with_caster(caster_with_spirit(100.0))
            .with_override(0, "flat", 20.0);
        let config = materialize(&template, &ctx);
        // 20 + 0.5 * 100
        assert!((flat_of(&config) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_override_for_absent_param_is_literal() {
        let template = spirit_template(5.0, 0.5);
        let ctx = MaterializationContext::new().with_override(0, "percent", 0.25);
        let config = materialize(&template, &ctx);
        match &config.effects[0] {
            SubEffect::StatModifier { percent, .. } => assert!((percent - 0.25).abs() < f64::EPSILON),
            other => panic!("Expected stat modifier, got {:?}", other),
        }
    }

    #[test]
    fn test_description_substitution() {
        let template = spirit_template(0.0, 0.5);
        let config = materialize(&template, &MaterializationContext::new().with_caster(caster_with_spirit(50.0)));
        assert_eq!(config.description, "Spirit +25");
    }

    #[test]
    fn test_missing_description_is_empty() {
        let template = EffectTemplate::new(
            "plain",
            "Plain",
            EffectCategory::Buff,
            EffectDuration::Permanent,
        );
        let config = materialize(&template, &MaterializationContext::new());
        assert_eq!(config.description, "");
    }

    #[test]
    fn test_render_description_edge_cases() {
        let mut values = BTreeMap::new();
        values.insert("dmg".to_string(), 12.346);
        values.insert("stacks".to_string(), 3.0);
        assert_eq!(render_description("{dmg} x{stacks}", &values), "12.35 x3");
        assert_eq!(render_description("{unknown} stays", &values), "{unknown} stays");
        assert_eq!(render_description("open { brace", &values), "open { brace");
        assert_eq!(render_description("", &values), "");
    }

    #[test]
    fn test_builtin_placeholders() {
        let template = EffectTemplate::new(
            "mark",
            "Mark",
            EffectCategory::Debuff,
            EffectDuration::Turns { value: 2 },
        )
        .with_description("{stacks}层，持续{duration}");
        let config = materialize(&template, &MaterializationContext::new().with_stacks(2));
        assert_eq!(config.description, "2层，持续2回合");
    }

    #[test]
    fn test_dot_defaults() {
        let template = EffectTemplate::new(
            "smolder",
            "Smolder",
            EffectCategory::DamageOverTime,
            EffectDuration::Turns { value: 2 },
        )
        .with_effect(SubEffectTemplate::new(SubEffectKind::DamageOverTime {
            flavor: DotFlavor::Burn,
            element: Element::Fire,
        }));
        let config = materialize(&template, &MaterializationContext::new());
        assert_eq!(
            config.effects[0],
            SubEffect::DamageOverTime {
                flavor: DotFlavor::Burn,
                element: Element::Fire,
                scale: 1.0
            }
        );
        assert!(config.deals_damage_over_time());
    }

    proptest! {
        #[test]
        fn prop_positive_coefficient_is_monotonic(
            low in 0.0f64..500.0,
            delta in 0.1f64..500.0,
            coefficient in 0.01f64..10.0,
        ) {
            let template = spirit_template(1.0, coefficient);
            let a = materialize(&template, &MaterializationContext::new().with_caster(caster_with_spirit(low)));
            let b = materialize(&template, &MaterializationContext::new().with_caster(caster_with_spirit(low + delta)));
            prop_assert!(flat_of(&b) > flat_of(&a));
        }
    }
}
