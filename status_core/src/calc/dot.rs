//! Damage and healing over time
//!
//! damage = (target_vitality * health_per_vitality * health_ratio
//!           + caster_spirit * spirit_ratio)
//!          * potency * scale * stacks * caster_element_multiplier
//!
//! The result is floored and never below 1 while the effect is active.

use crate::config::DotConstants;
use crate::registry::DotFlavor;
use unit_core::{Attribute, CasterSnapshot, Element};

/// Everything a single DoT tick needs
#[derive(Debug, Clone, Copy)]
pub struct DotTick<'a> {
    pub flavor: DotFlavor,
    pub element: Element,
    /// Resolved `scale` parameter of the sub-effect
    pub scale: f64,
    pub potency: f64,
    pub stacks: u32,
    pub target_vitality: f64,
    /// Snapshot captured at application time, never the live caster
    pub caster: &'a CasterSnapshot,
}

/// Damage dealt by one tick of a damage-over-time effect
pub fn calculate_dot_damage(tick: &DotTick<'_>, constants: &DotConstants) -> u64 {
    let ratios = constants.ratios(tick.flavor);
    let baseline = tick.target_vitality.max(0.0) * constants.health_per_vitality;
    let spirit = tick.caster.attribute(Attribute::Spirit).max(0.0);

    let raw = (baseline * ratios.health_ratio + spirit * ratios.spirit_ratio)
        * tick.potency.max(0.0)
        * tick.scale.max(0.0)
        * f64::from(tick.stacks.max(1))
        * tick.caster.element_multiplier(tick.element).max(0.0);

    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    raw.floor() as u64
}

/// Healing done by one tick of a heal-over-time effect
///
/// heal = (amount + max_hp * percent) * potency * stacks, floored at 0
pub fn calculate_heal_over_time(
    amount: f64,
    percent: f64,
    potency: f64,
    stacks: u32,
    target_max_hp: f64,
) -> u64 {
    let raw = (amount + target_max_hp.max(0.0) * percent) * potency * f64::from(stacks.max(1));
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor() as u64
}
