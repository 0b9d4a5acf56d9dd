//! Stateless calculators used by the runtime container

mod action;
mod attributes;
mod dot;
mod resistance;

pub use action::{calculate_action_block, ActionBlockResult};
pub use attributes::{calculate_attribute_modification, AttributeModification};
pub use dot::{calculate_dot_damage, calculate_heal_over_time, DotTick};
pub use resistance::{
    calculate_hit_chance, calculate_resist_ceiling, calculate_resist_chance, roll_resistance,
};
