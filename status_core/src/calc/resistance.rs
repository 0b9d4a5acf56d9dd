//! Resistance - probabilistic denial of hostile effects
//!
//! Formula:
//! - hit = clamp(hit_base + potency * hit_per_potency
//!               + (attacker_wp - defender_wp) * hit_per_willpower, hit_min, hit_max)
//! - ceiling = clamp(resist_base + defender_wp * resist_per_willpower, 0, resist_max)
//! - resist = clamp(ceiling * (1 - hit), 0, 1)

use crate::config::ResistanceConstants;
use rand::Rng;

/// Chance for a hostile effect to land before the defender's ceiling applies
pub fn calculate_hit_chance(
    attacker_willpower: f64,
    defender_willpower: f64,
    potency: f64,
    constants: &ResistanceConstants,
) -> f64 {
    let raw = constants.hit_base
        + potency * constants.hit_per_potency
        + (attacker_willpower - defender_willpower) * constants.hit_per_willpower;
    if raw.is_nan() {
        return constants.hit_min;
    }
    raw.clamp(constants.hit_min, constants.hit_max)
}

/// Upper bound on how often the defender can shrug an effect off
pub fn calculate_resist_ceiling(defender_willpower: f64, constants: &ResistanceConstants) -> f64 {
    let raw = constants.resist_base + defender_willpower * constants.resist_per_willpower;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, constants.resist_max.max(0.0))
}

/// Final probability in [0, 1] that an application is resisted
pub fn calculate_resist_chance(
    attacker_willpower: f64,
    defender_willpower: f64,
    potency: f64,
    constants: &ResistanceConstants,
) -> f64 {
    let hit = calculate_hit_chance(attacker_willpower, defender_willpower, potency, constants);
    let ceiling = calculate_resist_ceiling(defender_willpower, constants);
    let chance = ceiling * (1.0 - hit);
    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, 1.0)
}

/// Roll against a resist chance; true means the effect was resisted
pub fn roll_resistance(resist_chance: f64, rng: &mut impl Rng) -> bool {
    resist_chance > 0.0 && rng.gen::<f64>() < resist_chance
}
