//! Long-lived effects that outlive a single battle
//!
//! Only `persistent`-category instances are exported, as a minimal record.
//! Everything else about an instance is battle-transient.

use crate::container::{EffectInstance, NewInstance, StatusContainer};
use crate::registry::{EffectCategory, EffectDuration, StackingPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unit_core::QualityTier;

/// Absolute expiry, epoch milliseconds
pub const META_EXPIRES_AT: &str = "expiresAt";
/// Remaining charges; the effect lapses at zero
pub const META_REMAINING_USES: &str = "remainingUses";
/// Quality tier name, written on export so potency scaling survives reload
pub const META_QUALITY: &str = "quality";

/// Stored shape of a persistent effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStatus {
    pub status_key: String,
    pub potency: f64,
    /// Epoch milliseconds
    pub created_at: i64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PersistedStatus {
    pub fn new(status_key: impl Into<String>, potency: f64, created_at: i64) -> Self {
        PersistedStatus {
            status_key: status_key.into(),
            potency,
            created_at,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn remaining_uses(&self) -> Option<i64> {
        self.metadata.get(META_REMAINING_USES).and_then(Value::as_i64)
    }

    pub fn quality(&self) -> Option<QualityTier> {
        quality_from_metadata(&self.metadata)
    }
}

/// Whether metadata says the effect is over (expiry passed or no uses left)
pub fn metadata_lapsed(metadata: &Map<String, Value>, now: i64) -> bool {
    let expired = metadata
        .get(META_EXPIRES_AT)
        .and_then(Value::as_f64)
        .is_some_and(|at| at <= now as f64);
    let exhausted = metadata
        .get(META_REMAINING_USES)
        .and_then(Value::as_f64)
        .is_some_and(|uses| uses <= 0.0);
    expired || exhausted
}

/// Whether a stored record has already lapsed, without ticking anything
pub fn is_lapsed(record: &PersistedStatus, now: i64) -> bool {
    metadata_lapsed(&record.metadata, now)
}

/// Drop lapsed records, returning how many were removed
pub fn prune_lapsed(records: &mut Vec<PersistedStatus>, now: i64) -> usize {
    let before = records.len();
    records.retain(|r| !is_lapsed(r, now));
    before - records.len()
}

fn quality_from_metadata(metadata: &Map<String, Value>) -> Option<QualityTier> {
    metadata
        .get(META_QUALITY)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

impl StatusContainer {
    /// Persistent-category instances as storage records
    pub fn export_persistent(&self) -> Vec<PersistedStatus> {
        self.instances
            .iter()
            .filter(|i| i.category() == EffectCategory::Persistent)
            .map(|i| {
                let mut metadata = i.metadata.clone();
                if let Some(quality) = i.quality {
                    metadata.insert(META_QUALITY.to_string(), Value::from(quality.as_str()));
                }
                PersistedStatus {
                    status_key: i.key.clone(),
                    potency: i.potency,
                    created_at: i.created_at,
                    metadata,
                }
            })
            .collect()
    }

    /// Restore stored records, returning how many became active
    ///
    /// Unknown keys, lapsed records and keys already present are skipped.
    /// Restored instances use the container owner as caster.
    pub fn import_persistent(&mut self, records: &[PersistedStatus], now: i64) -> usize {
        let registry = std::sync::Arc::clone(self.registry());
        let mut imported = 0;

        for record in records {
            let Some(template) = registry.get(&record.status_key) else {
                tracing::warn!("Skipping persisted effect with unknown key '{}'", record.status_key);
                continue;
            };
            if is_lapsed(record, now) {
                tracing::debug!("Skipping lapsed persisted effect '{}'", record.status_key);
                continue;
            }
            if template.stacking != StackingPolicy::Independent
                && self.groups.contains_key(&record.status_key)
            {
                tracing::debug!("Persisted effect '{}' already active", record.status_key);
                continue;
            }

            let mut instance = EffectInstance::create(
                template,
                NewInstance {
                    stacks: 1,
                    duration: template.duration,
                    potency: record.potency,
                    caster: self.owner().clone(),
                    quality: record.quality(),
                    overrides: Default::default(),
                    metadata: record.metadata.clone(),
                    created_at: record.created_at,
                },
            );
            // Wall-clock effects count from creation, not from import.
            // Turn counts resume untouched.
            if matches!(instance.duration, EffectDuration::WallClock { .. }) {
                instance.advance(now);
            }
            if instance.is_expired_at(now) {
                tracing::debug!("Persisted effect '{}' ran out while stored", record.status_key);
                continue;
            }

            self.insert_instance(instance);
            imported += 1;
        }

        imported
    }

    /// Spend one charge of a use-counted effect, returning the charges left
    ///
    /// Returns `None` when the key is absent or not use-counted. An effect
    /// that reaches zero expires on the next tick.
    pub fn consume_use(&mut self, key: &str) -> Option<u64> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.key == key && i.metadata.contains_key(META_REMAINING_USES))?;
        let uses = instance.metadata.get(META_REMAINING_USES)?.as_u64()?;
        let left = uses.saturating_sub(1);
        instance
            .metadata
            .insert(META_REMAINING_USES.to_string(), Value::from(left));
        Some(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ApplicationRequest, TickContext};
    use crate::registry::{EffectRegistry, EffectTemplate};
    use rand::rngs::mock::StepRng;
    use std::sync::Arc;
    use unit_core::{Attribute, UnitSnapshot};

    fn target() -> UnitSnapshot {
        UnitSnapshot::new("u1", "墨大夫", 600.0, 200.0).with_attribute(Attribute::Willpower, 30.0)
    }

    fn container() -> StatusContainer {
        StatusContainer::new(target().to_caster(), Arc::new(EffectRegistry::builtin().unwrap()))
    }

    fn apply(c: &mut StatusContainer, request: ApplicationRequest) {
        let result = c.add_status_with_rng(request, &target(), &mut StepRng::new(u64::MAX, 0));
        assert!(result.success);
    }

    #[test]
    fn test_record_wire_shape() {
        let record = PersistedStatus::new("inner_demon", 1.5, 1_700_000_000_000)
            .with_metadata(META_REMAINING_USES, 3);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["statusKey"], "inner_demon");
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
        assert_eq!(json["metadata"]["remainingUses"], 3);

        let back: PersistedStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_lapse_rules() {
        let fresh = PersistedStatus::new("inner_demon", 1.0, 0);
        assert!(!is_lapsed(&fresh, 10));

        let dated = fresh.clone().with_metadata(META_EXPIRES_AT, 100);
        assert!(!is_lapsed(&dated, 99));
        assert!(is_lapsed(&dated, 100));

        let spent = fresh.clone().with_metadata(META_REMAINING_USES, 0);
        assert!(is_lapsed(&spent, 0));

        let mut records = vec![fresh, dated, spent];
        assert_eq!(prune_lapsed(&mut records, 500), 2);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_export_only_persistent_with_quality() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("burn"));
        apply(
            &mut c,
            ApplicationRequest::new("pill_essence")
                .with_quality(QualityTier::Heaven)
                .with_potency(2.0)
                .at(5_000),
        );

        let records = c.export_persistent();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status_key, "pill_essence");
        assert_eq!(records[0].created_at, 5_000);
        assert_eq!(records[0].quality(), Some(QualityTier::Heaven));
    }

    #[test]
    fn test_import_reconstructs_config() {
        let mut source = container();
        apply(
            &mut source,
            ApplicationRequest::new("pill_essence")
                .with_quality(QualityTier::Heaven)
                .at(0),
        );
        let records = source.export_persistent();

        let mut restored = container();
        assert_eq!(restored.import_persistent(&records, 1_000), 1);
        assert_eq!(
            restored.active_statuses()[0].config,
            source.active_statuses()[0].config
        );
        assert_eq!(restored.active_statuses()[0].remaining, 3_599_000);
    }

    #[test]
    fn test_import_skips_unknown_lapsed_and_present() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("inner_demon"));

        let records = vec![
            PersistedStatus::new("forgotten_art", 1.0, 0),
            PersistedStatus::new("pill_essence", 1.0, 0).with_metadata(META_EXPIRES_AT, 10),
            PersistedStatus::new("inner_demon", 1.0, 0),
            // Wall-clock duration already used up in storage
            PersistedStatus::new("pill_essence", 1.0, 0),
        ];
        assert_eq!(c.import_persistent(&records, 4_000_000), 0);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_import_keeps_turn_counts() {
        let mut registry = EffectRegistry::new();
        registry.register(EffectTemplate::new(
            "vow",
            "Vow",
            EffectCategory::Persistent,
            EffectDuration::Turns { value: 2 },
        ));
        registry.register(EffectTemplate::new(
            "oath",
            "Oath",
            EffectCategory::Persistent,
            EffectDuration::Turns { value: 1 },
        ));
        let registry = Arc::new(registry);

        let mut source = StatusContainer::new(target().to_caster(), Arc::clone(&registry));
        apply(&mut source, ApplicationRequest::new("vow").at(0));
        apply(&mut source, ApplicationRequest::new("oath").at(0));
        let records = source.export_persistent();
        assert_eq!(records.len(), 2);

        let mut restored = StatusContainer::new(target().to_caster(), registry);
        assert_eq!(restored.import_persistent(&records, 0), 2);
        let remaining = |key: &str| {
            restored
                .active_statuses()
                .iter()
                .find(|i| i.key == key)
                .map(|i| i.remaining)
        };
        assert_eq!(remaining("vow"), Some(2));
        assert_eq!(remaining("oath"), Some(1));
    }

    #[test]
    fn test_consume_use() {
        let mut c = container();
        apply(
            &mut c,
            ApplicationRequest::new("inner_demon").with_metadata(META_REMAINING_USES, 2),
        );
        assert_eq!(c.consume_use("inner_demon"), Some(1));
        assert_eq!(c.consume_use("inner_demon"), Some(0));
        assert_eq!(c.consume_use("burn"), None);

        let t = target();
        let result = c.tick(&TickContext::new(&t).at(0));
        assert_eq!(result.expired_status_ids.len(), 1);
        assert!(c.is_empty());
    }
}
