use crate::materialize::{materialize, EffectConfig, MaterializationContext, ParamOverrides};
use crate::persist::metadata_lapsed;
use crate::registry::{EffectCategory, EffectDuration, EffectTemplate};
use serde_json::{Map, Value};
use unit_core::{CasterSnapshot, QualityTier};
use uuid::Uuid;

/// One active occurrence of an effect on one combatant
///
/// Owned by exactly one [`super::StatusContainer`]; callers only ever see
/// shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    pub id: String,
    pub key: String,
    /// Always in `1..=config.max_stacks`
    pub stacks: u32,
    /// Turns left, or milliseconds left for wall-clock durations
    pub remaining: i64,
    /// Template duration with any request override applied
    pub duration: EffectDuration,
    pub potency: f64,
    /// Captured at application time
    pub caster: CasterSnapshot,
    pub quality: Option<QualityTier>,
    pub overrides: ParamOverrides,
    pub metadata: Map<String, Value>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Start of the current duration window (reset on refresh)
    pub started_at: i64,
    pub config: EffectConfig,
}

/// Fields needed to create an instance
pub(crate) struct NewInstance {
    pub stacks: u32,
    pub duration: EffectDuration,
    pub potency: f64,
    pub caster: CasterSnapshot,
    pub quality: Option<QualityTier>,
    pub overrides: ParamOverrides,
    pub metadata: Map<String, Value>,
    pub created_at: i64,
}

impl EffectInstance {
    pub(crate) fn create(template: &EffectTemplate, fields: NewInstance) -> Self {
        let stacks = fields.stacks.clamp(1, template.stack_cap());
        let ctx = MaterializationContext {
            caster: Some(fields.caster.clone()),
            quality: fields.quality,
            stacks: Some(stacks),
            overrides: fields.overrides.clone(),
        };
        EffectInstance {
            id: Uuid::new_v4().to_string(),
            key: template.key.clone(),
            stacks,
            remaining: fields.duration.initial_remaining(),
            duration: fields.duration,
            potency: fields.potency,
            caster: fields.caster,
            quality: fields.quality,
            overrides: fields.overrides,
            metadata: fields.metadata,
            created_at: fields.created_at,
            started_at: fields.created_at,
            config: materialize(template, &ctx),
        }
    }

    /// The context that produced this instance's config
    pub fn context(&self) -> MaterializationContext {
        MaterializationContext {
            caster: Some(self.caster.clone()),
            quality: self.quality,
            stacks: Some(self.stacks),
            overrides: self.overrides.clone(),
        }
    }

    pub(crate) fn rematerialize(&mut self, template: &EffectTemplate) {
        self.config = materialize(template, &self.context());
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn category(&self) -> EffectCategory {
        self.config.category
    }

    pub fn is_permanent(&self) -> bool {
        self.duration.is_permanent()
    }

    /// Restart the duration window
    pub(crate) fn refresh(&mut self, duration: EffectDuration, now: i64) {
        self.duration = duration;
        self.remaining = duration.initial_remaining();
        self.started_at = now;
    }

    /// Advance one tick: turns drop by one, wall-clock is recomputed
    pub(crate) fn advance(&mut self, now: i64) {
        match self.duration {
            EffectDuration::Turns { .. } => self.remaining -= 1,
            EffectDuration::WallClock { millis } => {
                self.remaining = millis - (now - self.started_at);
            }
            EffectDuration::Permanent => {}
        }
        tracing::trace!("Effect '{}' ({}) remaining {}", self.key, self.id, self.remaining);
    }

    /// Whether this instance should be removed
    pub fn is_expired_at(&self, now: i64) -> bool {
        (!self.is_permanent() && self.remaining <= 0) || metadata_lapsed(&self.metadata, now)
    }
}
