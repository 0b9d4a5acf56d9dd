//! Battle save/resume: a container flattened into records and back

use super::{EffectInstance, StatusContainer, StatusError};
use crate::materialize::{materialize, MaterializationContext, ParamOverrides};
use crate::registry::{EffectDuration, EffectRegistry, StackingPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use unit_core::{CasterSnapshot, QualityTier};

/// Flat, serializable form of one effect instance
///
/// Configs are not stored; they are re-materialized from the template on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub key: String,
    pub stacks: u32,
    pub remaining: i64,
    pub duration: EffectDuration,
    pub potency: f64,
    /// Resolved through a lookup on load
    pub caster_id: String,
    #[serde(default)]
    pub quality: Option<QualityTier>,
    #[serde(default)]
    pub overrides: ParamOverrides,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: i64,
    pub started_at: i64,
}

impl StatusRecord {
    fn from_instance(instance: &EffectInstance) -> Self {
        StatusRecord {
            id: instance.id.clone(),
            key: instance.key.clone(),
            stacks: instance.stacks,
            remaining: instance.remaining,
            duration: instance.duration,
            potency: instance.potency,
            caster_id: instance.caster.unit_id.clone(),
            quality: instance.quality,
            overrides: instance.overrides.clone(),
            metadata: instance.metadata.clone(),
            created_at: instance.created_at,
            started_at: instance.started_at,
        }
    }
}

impl StatusContainer {
    /// Every active instance as a flat record list
    pub fn to_records(&self) -> Vec<StatusRecord> {
        self.instances.iter().map(StatusRecord::from_instance).collect()
    }

    pub fn to_json(&self) -> Result<String, StatusError> {
        Ok(serde_json::to_string(&self.to_records())?)
    }

    /// Rebuild a container from records
    ///
    /// Casters are re-resolved through `lookup`; a caster that cannot be
    /// found (e.g. it left combat) falls back to `owner`. Unknown keys and
    /// duplicate key-groups are skipped with a warning.
    pub fn from_records<F>(
        owner: CasterSnapshot,
        registry: Arc<EffectRegistry>,
        records: Vec<StatusRecord>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<CasterSnapshot>,
    {
        let mut container = StatusContainer::new(owner, Arc::clone(&registry));

        for record in records {
            let Some(template) = registry.get(&record.key) else {
                tracing::warn!("Skipping saved effect with unknown key '{}'", record.key);
                continue;
            };
            if template.stacking != StackingPolicy::Independent
                && container.groups.contains_key(&record.key)
            {
                tracing::warn!("Skipping duplicate key-group '{}' in battle save", record.key);
                continue;
            }

            let caster = lookup(&record.caster_id).unwrap_or_else(|| {
                tracing::debug!(
                    "Caster '{}' not found, falling back to owner for '{}'",
                    record.caster_id,
                    record.key
                );
                container.owner().clone()
            });
            let stacks = record.stacks.clamp(1, template.stack_cap());
            let ctx = MaterializationContext {
                caster: Some(caster.clone()),
                quality: record.quality,
                stacks: Some(stacks),
                overrides: record.overrides.clone(),
            };

            container.insert_instance(EffectInstance {
                id: record.id,
                key: record.key,
                stacks,
                remaining: record.remaining,
                duration: record.duration,
                potency: record.potency,
                caster,
                quality: record.quality,
                overrides: record.overrides,
                metadata: record.metadata,
                created_at: record.created_at,
                started_at: record.started_at,
                config: materialize(template, &ctx),
            });
        }

        container
    }

    pub fn from_json<F>(
        json: &str,
        owner: CasterSnapshot,
        registry: Arc<EffectRegistry>,
        lookup: F,
    ) -> Result<Self, StatusError>
    where
        F: Fn(&str) -> Option<CasterSnapshot>,
    {
        let records: Vec<StatusRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(owner, registry, records, lookup))
    }
}
