//! Effect application: validation, resistance, conflicts and stacking

use super::{ApplicationEvent, EffectInstance, EventKind, NewInstance, StatusContainer};
use crate::calc::{calculate_resist_chance, roll_resistance};
use crate::clock::now_millis;
use crate::materialize::{ParamOverrides, SubEffect};
use crate::registry::{EffectTemplate, StackingPolicy};
use rand::Rng;
use serde_json::{Map, Value};
use std::sync::Arc;
use unit_core::{Attribute, CasterSnapshot, QualityTier, UnitSnapshot};

/// A request to apply one effect to the container's owner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationRequest {
    pub template_key: String,
    /// Defaults to the container owner (self-applied)
    pub caster: Option<CasterSnapshot>,
    /// Defaults to 1.0
    pub potency: Option<f64>,
    /// Turns or milliseconds, matching the template's duration kind
    pub duration_override: Option<i64>,
    /// Defaults to 1
    pub stack_to_add: Option<u32>,
    pub metadata: Option<Map<String, Value>>,
    pub quality: Option<QualityTier>,
    pub overrides: ParamOverrides,
    /// Epoch milliseconds; defaults to now
    pub applied_at: Option<i64>,
}

impl ApplicationRequest {
    pub fn new(template_key: impl Into<String>) -> Self {
        ApplicationRequest {
            template_key: template_key.into(),
            ..Default::default()
        }
    }

    pub fn with_caster(mut self, caster: CasterSnapshot) -> Self {
        self.caster = Some(caster);
        self
    }

    pub fn with_potency(mut self, potency: f64) -> Self {
        self.potency = Some(potency);
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration_override = Some(duration);
        self
    }

    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stack_to_add = Some(stacks);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_override(mut self, index: usize, param: impl Into<String>, value: f64) -> Self {
        self.overrides.entry(index).or_default().insert(param.into(), value);
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.applied_at = Some(timestamp);
        self
    }
}

/// Outcome of one application
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub success: bool,
    pub status_id: Option<String>,
    /// Distinguishes a failed resistance roll from a rejection
    pub resisted: bool,
    pub message: String,
    pub kind: EventKind,
    /// Stacks on the affected instance after the call (0 on failure)
    pub stacks: u32,
    /// Results of `apply_effect` chains triggered by this application
    pub chained: Vec<ApplyResult>,
}

impl ApplyResult {
    fn failure(kind: EventKind, message: String) -> Self {
        ApplyResult {
            success: false,
            status_id: None,
            resisted: kind == EventKind::Resisted,
            message,
            kind,
            stacks: 0,
            chained: Vec::new(),
        }
    }

    fn success(kind: EventKind, instance: &EffectInstance, message: String) -> Self {
        ApplyResult {
            success: true,
            status_id: Some(instance.id.clone()),
            resisted: false,
            message,
            kind,
            stacks: instance.stacks,
            chained: Vec::new(),
        }
    }
}

impl StatusContainer {
    /// Apply an effect to this container's owner
    ///
    /// `target` is the owner's current state; it supplies the defender's
    /// willpower for the resistance roll.
    pub fn add_status(&mut self, request: ApplicationRequest, target: &UnitSnapshot) -> ApplyResult {
        let mut rng = rand::thread_rng();
        self.add_status_with_rng(request, target, &mut rng)
    }

    /// Apply an effect with a provided RNG (for deterministic testing)
    pub fn add_status_with_rng(
        &mut self,
        request: ApplicationRequest,
        target: &UnitSnapshot,
        rng: &mut impl Rng,
    ) -> ApplyResult {
        self.apply_at_depth(request, target, rng, 0)
    }

    fn apply_at_depth(
        &mut self,
        request: ApplicationRequest,
        target: &UnitSnapshot,
        rng: &mut impl Rng,
        depth: u32,
    ) -> ApplyResult {
        let now = request.applied_at.unwrap_or_else(now_millis);
        let registry = Arc::clone(self.registry());

        // Step 1: Unknown keys are rejected
        let Some(template) = registry.get(&request.template_key) else {
            tracing::warn!("Unknown effect template '{}'", request.template_key);
            let message = format!("未知状态: {}", request.template_key);
            self.push_event(ApplicationEvent::new(
                EventKind::Rejected,
                request.template_key.clone(),
                None,
                message.clone(),
                now,
            ));
            return ApplyResult::failure(EventKind::Rejected, message);
        };

        let caster = request.caster.clone().unwrap_or_else(|| self.owner().clone());
        let potency = request.potency.unwrap_or(1.0);

        // Step 2: Hostile effects roll resistance
        if template.is_hostile() {
            let chance = calculate_resist_chance(
                caster.attribute(Attribute::Willpower),
                target.attribute(Attribute::Willpower),
                potency,
                &self.constants().resistance,
            );
            if roll_resistance(chance, rng) {
                let message = format!("{}抵抗了【{}】", target.name, template.name);
                tracing::debug!(
                    "'{}' resisted by {} (chance {:.3})",
                    template.key,
                    target.unit_id,
                    chance
                );
                self.push_event(ApplicationEvent::new(
                    EventKind::Resisted,
                    template.key.clone(),
                    None,
                    message.clone(),
                    now,
                ));
                return ApplyResult::failure(EventKind::Resisted, message);
            }
        }

        // Step 3: Conflicts go before stacking
        self.remove_conflicts(template);

        // Steps 4-5: Stack, refresh or create
        let existing = match template.stacking {
            StackingPolicy::Independent => None,
            _ => self.group_index(&template.key),
        };
        let mut result = match existing {
            Some(index) => self.reapply(index, template, &request, caster, potency, now),
            None => self.create(template, &request, caster, potency, now),
        };

        if depth < self.constants().max_chain_depth {
            result.chained = self.apply_chains(&result, &request, target, rng, depth, now);
        }

        result
    }

    /// Remove existing effects that cannot coexist with `template`
    fn remove_conflicts(&mut self, template: &EffectTemplate) {
        let registry = Arc::clone(self.registry());
        let conflicting: Vec<String> = self
            .instances
            .iter()
            .filter(|i| i.key != template.key)
            .filter(|i| {
                template.conflicts_with_key(&i.key)
                    || registry
                        .get(&i.key)
                        .is_some_and(|existing| existing.conflicts_with_key(&template.key))
            })
            .map(|i| i.id.clone())
            .collect();

        for id in conflicting {
            self.remove_instance(&id);
        }
    }

    fn reapply(
        &mut self,
        index: usize,
        template: &EffectTemplate,
        request: &ApplicationRequest,
        caster: CasterSnapshot,
        potency: f64,
        now: i64,
    ) -> ApplyResult {
        let duration = template.duration.with_override(request.duration_override);
        let cap = template.stack_cap();
        let instance = &mut self.instances[index];

        let kind = match template.stacking {
            StackingPolicy::Stack if instance.stacks < cap => {
                let add = request.stack_to_add.unwrap_or(1).max(1);
                instance.stacks = instance.stacks.saturating_add(add).min(cap);
                EventKind::Stacked
            }
            _ => EventKind::Refreshed,
        };

        // Newest caster wins, potency never drops on reapplication
        instance.caster = caster;
        instance.potency = instance.potency.max(potency);
        if request.quality.is_some() {
            instance.quality = request.quality;
        }
        if let Some(metadata) = &request.metadata {
            for (k, v) in metadata {
                instance.metadata.insert(k.clone(), v.clone());
            }
        }
        instance.refresh(duration, now);
        instance.rematerialize(template);

        let message = match kind {
            EventKind::Stacked => format!("【{}】叠加至{}层", template.name, instance.stacks),
            _ if template.stacking == StackingPolicy::Stack => {
                format!("【{}】已达上限{}层，持续时间刷新", template.name, instance.stacks)
            }
            _ => format!("【{}】持续时间刷新", template.name),
        };
        tracing::debug!("{} '{}' to {} stacks", kind, template.key, instance.stacks);

        let result = ApplyResult::success(kind, instance, message.clone());
        let event = ApplicationEvent::new(
            kind,
            template.key.clone(),
            Some(instance.id.clone()),
            message,
            now,
        );
        self.push_event(event);
        result
    }

    fn create(
        &mut self,
        template: &EffectTemplate,
        request: &ApplicationRequest,
        caster: CasterSnapshot,
        potency: f64,
        now: i64,
    ) -> ApplyResult {
        let stacks = match template.stacking {
            StackingPolicy::Stack => request.stack_to_add.unwrap_or(1),
            _ => 1,
        };
        let instance = EffectInstance::create(
            template,
            NewInstance {
                stacks,
                duration: template.duration.with_override(request.duration_override),
                potency,
                caster,
                quality: request.quality,
                overrides: request.overrides.clone(),
                metadata: request.metadata.clone().unwrap_or_default(),
                created_at: now,
            },
        );

        let message = format!("【{}】生效", template.name);
        tracing::debug!("Applied '{}' ({})", template.key, instance.id);

        let result = ApplyResult::success(EventKind::Applied, &instance, message.clone());
        self.push_event(ApplicationEvent::new(
            EventKind::Applied,
            template.key.clone(),
            Some(instance.id.clone()),
            message,
            now,
        ));
        self.insert_instance(instance);
        result
    }

    /// Roll and apply every `apply_effect` of the instance just touched
    fn apply_chains(
        &mut self,
        result: &ApplyResult,
        request: &ApplicationRequest,
        target: &UnitSnapshot,
        rng: &mut impl Rng,
        depth: u32,
        now: i64,
    ) -> Vec<ApplyResult> {
        let Some(id) = result.status_id.as_deref() else {
            return Vec::new();
        };
        let Some(instance) = self.instance(id) else {
            return Vec::new();
        };

        let chains: Vec<(String, f64)> = instance
            .config
            .effects
            .iter()
            .filter_map(|effect| match effect {
                SubEffect::ApplyEffect { effect, chance } => Some((effect.clone(), *chance)),
                _ => None,
            })
            .collect();
        let caster = instance.caster.clone();
        let potency = instance.potency;

        let mut chained = Vec::new();
        for (key, chance) in chains {
            if chance < 1.0 && rng.gen::<f64>() >= chance {
                continue;
            }
            let mut next = ApplicationRequest::new(key)
                .with_caster(caster.clone())
                .with_potency(potency)
                .at(now);
            next.quality = request.quality;
            chained.push(self.apply_at_depth(next, target, rng, depth + 1));
        }
        chained
    }
}
