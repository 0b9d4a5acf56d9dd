//! Prelude module for convenient imports
//!
//! ```rust
//! use status_core::prelude::*;
//! ```

// Registry
pub use crate::registry::{
    EffectCategory, EffectDuration, EffectRegistry, EffectTag, EffectTemplate, StackingPolicy,
};

// Runtime container
pub use crate::container::{
    ApplicationRequest, ApplyResult, EventKind, StatusContainer, TickContext, TickResult,
};

// Calculator outputs
pub use crate::calc::{ActionBlockResult, AttributeModification};

// Config
pub use crate::config::StatusConstants;

// Persistence
pub use crate::persist::PersistedStatus;

// Re-exports from unit_core
pub use unit_core::{Attribute, CasterSnapshot, Element, QualityTier, UnitSnapshot};
