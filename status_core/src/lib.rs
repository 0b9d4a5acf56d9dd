//! status_core - Temporal effect engine for cultivation combat
//!
//! This library provides:
//! - EffectRegistry: Author-defined effect templates, loaded once at boot
//! - materialize: Template + context into concrete numbers
//! - StatusContainer: Per-combatant owner of active effects (apply, tick, query)
//! - calc: Resistance, damage-over-time, attribute and action-block calculators
//! - persist: Long-lived effect records that outlive a battle
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use status_core::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(EffectRegistry::builtin()?);
//! let target = UnitSnapshot::new("hanli", "韩立", 1000.0, 300.0)
//!     .with_attribute(Attribute::Vitality, 100.0);
//! let mut statuses = StatusContainer::new(target.to_caster(), registry);
//!
//! // An enemy cultivator sets the target ablaze
//! let caster = CasterSnapshot::new("elder", "大长老").with_attribute(Attribute::Spirit, 120.0);
//! let result = statuses.add_status(ApplicationRequest::new("burn").with_caster(caster), &target);
//! assert!(result.success);
//!
//! // Once per round
//! let tick = statuses.tick(&TickContext::new(&target));
//! for line in &tick.effect_logs {
//!     println!("{}", line);
//! }
//! ```

pub mod calc;
pub mod clock;
pub mod config;
pub mod container;
pub mod materialize;
pub mod persist;
pub mod prelude;
pub mod registry;

// Core API - what most users need
pub use container::{
    ApplicationEvent, ApplicationRequest, ApplyResult, EffectInstance, EventKind, StatusContainer,
    StatusError, TickContext, TickResult,
};
pub use registry::{EffectRegistry, EffectTemplate};

// Materialization
pub use materialize::{materialize, EffectConfig, MaterializationContext, SubEffect};

// Calculator outputs
pub use calc::{ActionBlockResult, AttributeModification};

// Configuration
pub use config::{ConfigError, StatusConstants};

// Persistence
pub use persist::PersistedStatus;

// Re-export the shared combatant vocabulary
pub use unit_core::{Attribute, CasterSnapshot, Element, QualityTier, UnitSnapshot};
