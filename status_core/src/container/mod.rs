//! Runtime container - the per-combatant owner of every active effect
//!
//! Instances live in one flat list. Stackable and refreshable effects are
//! additionally indexed by key (at most one key-group each); independent
//! effects are only in the flat list.

mod apply;
mod events;
mod instance;
mod serialize;
mod tick;

pub use apply::{ApplicationRequest, ApplyResult};
pub use events::{ApplicationEvent, EventKind};
pub use instance::EffectInstance;
pub use serialize::StatusRecord;
pub use tick::{TickContext, TickResult};

pub(crate) use instance::NewInstance;

use crate::calc::{
    calculate_action_block, calculate_attribute_modification, ActionBlockResult,
    AttributeModification,
};
use crate::clock::now_millis;
use crate::config::StatusConstants;
use crate::registry::{EffectRegistry, EffectTag, StackingPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use unit_core::{CasterSnapshot, UnitSnapshot};

/// Programmer errors at the serialization boundary
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Invalid battle save: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// All active effects on one combatant
#[derive(Debug, Clone)]
pub struct StatusContainer {
    /// The combatant this container belongs to
    owner: CasterSnapshot,
    registry: Arc<EffectRegistry>,
    constants: Arc<StatusConstants>,
    pub(crate) instances: Vec<EffectInstance>,
    /// Template key -> instance id, for non-independent effects
    pub(crate) groups: HashMap<String, String>,
    events: Vec<ApplicationEvent>,
}

impl StatusContainer {
    /// Create an empty container with default constants
    pub fn new(owner: CasterSnapshot, registry: Arc<EffectRegistry>) -> Self {
        StatusContainer {
            owner,
            registry,
            constants: Arc::new(StatusConstants::default()),
            instances: Vec::new(),
            groups: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Use a shared set of tuning constants
    pub fn with_constants(mut self, constants: Arc<StatusConstants>) -> Self {
        self.constants = constants;
        self
    }

    pub fn owner(&self) -> &CasterSnapshot {
        &self.owner
    }

    pub fn registry(&self) -> &Arc<EffectRegistry> {
        &self.registry
    }

    pub fn constants(&self) -> &Arc<StatusConstants> {
        &self.constants
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub fn has_status(&self, key: &str) -> bool {
        self.instances.iter().any(|i| i.key == key)
    }

    /// Total stacks across every instance of a key (0 when absent)
    pub fn stack_count(&self, key: &str) -> u32 {
        self.instances
            .iter()
            .filter(|i| i.key == key)
            .map(|i| i.stacks)
            .sum()
    }

    pub fn active_statuses(&self) -> &[EffectInstance] {
        &self.instances
    }

    /// Find an instance by id
    pub fn instance(&self, id: &str) -> Option<&EffectInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Distinct active keys in application order
    pub fn active_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for instance in &self.instances {
            if !keys.contains(&instance.key.as_str()) {
                keys.push(&instance.key);
            }
        }
        keys
    }

    pub fn statuses_with_tag(&self, tag: EffectTag) -> Vec<&EffectInstance> {
        self.instances
            .iter()
            .filter(|i| i.config.has_tag(tag))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    // ============================================================================
    // Derived state
    // ============================================================================

    /// Sum of every active effect's attribute contribution
    pub fn attribute_modification(&self, target: &UnitSnapshot) -> AttributeModification {
        let mut total = AttributeModification::new();
        for instance in &self.instances {
            total.merge(&calculate_attribute_modification(
                &instance.config,
                instance.potency,
                target,
            ));
        }
        total
    }

    /// What the owner may do this round
    pub fn action_capability(&self) -> ActionBlockResult {
        let mut result = ActionBlockResult::default();
        for instance in &self.instances {
            result.combine(calculate_action_block(&instance.config));
        }
        result
    }

    // ============================================================================
    // Removal
    // ============================================================================

    /// Remove every instance of a key, returning how many were removed
    pub fn remove_status(&mut self, key: &str) -> usize {
        self.remove_where(|i| i.key == key)
    }

    pub fn remove_instance(&mut self, id: &str) -> bool {
        self.remove_where(|i| i.id == id) > 0
    }

    /// Dispel everything carrying a tag
    pub fn remove_by_tag(&mut self, tag: EffectTag) -> usize {
        self.remove_where(|i| i.config.has_tag(tag))
    }

    /// Remove every debuff and control effect
    pub fn cleanse_hostile(&mut self) -> usize {
        self.remove_where(|i| i.config.is_hostile())
    }

    pub fn clear(&mut self) -> usize {
        self.remove_where(|_| true)
    }

    fn remove_where(&mut self, predicate: impl Fn(&EffectInstance) -> bool) -> usize {
        let now = now_millis();
        let (removed, kept): (Vec<EffectInstance>, Vec<EffectInstance>) =
            std::mem::take(&mut self.instances)
                .into_iter()
                .partition(|i| predicate(i));
        self.instances = kept;

        for instance in &removed {
            self.ungroup(instance);
            tracing::debug!("Removed effect '{}' ({})", instance.key, instance.id);
            self.events.push(ApplicationEvent::new(
                EventKind::Removed,
                instance.key.clone(),
                Some(instance.id.clone()),
                format!("【{}】被移除", instance.name()),
                now,
            ));
        }
        removed.len()
    }

    pub(crate) fn ungroup(&mut self, instance: &EffectInstance) {
        if self.groups.get(&instance.key) == Some(&instance.id) {
            self.groups.remove(&instance.key);
        }
    }

    /// Track a new instance, grouping it by key unless it is independent
    pub(crate) fn insert_instance(&mut self, instance: EffectInstance) {
        if instance.config.stacking != StackingPolicy::Independent {
            self.groups.insert(instance.key.clone(), instance.id.clone());
        }
        self.instances.push(instance);
    }

    pub(crate) fn group_index(&self, key: &str) -> Option<usize> {
        let id = self.groups.get(key)?;
        self.instances.iter().position(|i| &i.id == id)
    }

    // ============================================================================
    // Event log
    // ============================================================================

    pub fn events(&self) -> &[ApplicationEvent] {
        &self.events
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<ApplicationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub(crate) fn push_event(&mut self, event: ApplicationEvent) {
        self.events.push(event);
    }
}
