//! unit_core - Shared combatant vocabulary for the cultivation combat engine
//!
//! Attributes, elements, quality grades and the snapshot types that effect
//! calculators read from. Nothing here holds behavior beyond lookups.

pub mod snapshot;
pub mod types;

pub use snapshot::{CasterSnapshot, UnitSnapshot};
pub use types::{Attribute, Attributes, Element, ParseError, QualityTier, Resource};
