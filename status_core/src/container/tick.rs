//! Per-round processing: durations, damage and healing over time, expiry

use super::{ApplicationEvent, EventKind, StatusContainer};
use crate::calc::{calculate_dot_damage, calculate_heal_over_time, DotTick};
use crate::clock::now_millis;
use crate::materialize::SubEffect;
use std::collections::BTreeMap;
use unit_core::{Attribute, UnitSnapshot};

/// Inputs for one tick
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// The container owner's current state
    pub target: &'a UnitSnapshot,
    /// Epoch milliseconds
    pub now: i64,
}

impl<'a> TickContext<'a> {
    pub fn new(target: &'a UnitSnapshot) -> Self {
        TickContext {
            target,
            now: now_millis(),
        }
    }

    pub fn at(mut self, now: i64) -> Self {
        self.now = now;
        self
    }
}

/// Aggregated outcome of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    pub damage_dealt: u64,
    pub healing_done: u64,
    /// Ids of instances removed this tick, in processing order
    pub expired_status_ids: Vec<String>,
    /// One merged line per key, in category-priority order
    pub effect_logs: Vec<String>,
    pub damage_by_status: BTreeMap<String, u64>,
}

/// Per-key aggregate, so stacked or independent instances log once
#[derive(Debug, Default)]
struct KeyTotals {
    name: String,
    stacks: u32,
    damage: u64,
    healing: u64,
}

enum LogSlot {
    Totals(String),
    Expiry(String),
}

impl StatusContainer {
    /// Advance every effect by one round
    pub fn tick(&mut self, ctx: &TickContext<'_>) -> TickResult {
        let target = ctx.target;
        let healing_factor = self.attribute_modification(target).healing_factor();
        let constants = std::sync::Arc::clone(self.constants());

        // Stable sort: equal priorities keep application order
        let mut order: Vec<usize> = (0..self.instances.len()).collect();
        order.sort_by_key(|&i| self.instances[i].category().priority());

        let mut totals: BTreeMap<String, KeyTotals> = BTreeMap::new();
        let mut slots: Vec<LogSlot> = Vec::new();
        let mut expired: Vec<usize> = Vec::new();

        for index in order {
            let instance = &mut self.instances[index];
            instance.advance(ctx.now);

            let mut damage: u64 = 0;
            let mut healing: u64 = 0;
            for effect in &instance.config.effects {
                match effect {
                    SubEffect::DamageOverTime {
                        flavor,
                        element,
                        scale,
                    } => {
                        damage = damage.saturating_add(calculate_dot_damage(
                            &DotTick {
                                flavor: *flavor,
                                element: *element,
                                scale: *scale,
                                potency: instance.potency,
                                stacks: instance.stacks,
                                target_vitality: target.attribute(Attribute::Vitality),
                                caster: &instance.caster,
                            },
                            &constants.dot,
                        ));
                    }
                    SubEffect::HealOverTime { amount, percent } => {
                        let raw = calculate_heal_over_time(
                            *amount,
                            *percent,
                            instance.potency,
                            instance.stacks,
                            target.max_hp,
                        );
                        healing = healing.saturating_add((raw as f64 * healing_factor).floor() as u64);
                    }
                    _ => {}
                }
            }

            if damage > 0 || healing > 0 {
                let entry = totals.entry(instance.key.clone()).or_insert_with(|| {
                    slots.push(LogSlot::Totals(instance.key.clone()));
                    KeyTotals {
                        name: instance.config.name.clone(),
                        ..Default::default()
                    }
                });
                entry.stacks = entry.stacks.saturating_add(instance.stacks);
                entry.damage = entry.damage.saturating_add(damage);
                entry.healing = entry.healing.saturating_add(healing);
            }

            if instance.is_expired_at(ctx.now) {
                let name = instance.config.name.clone();
                if !slots.iter().any(|s| matches!(s, LogSlot::Expiry(n) if *n == name)) {
                    slots.push(LogSlot::Expiry(name));
                }
                expired.push(index);
            }
        }

        let mut result = TickResult::default();
        for slot in &slots {
            match slot {
                LogSlot::Totals(key) => {
                    let Some(t) = totals.get(key) else { continue };
                    if t.damage > 0 {
                        result.effect_logs.push(format!(
                            "【{}】({}层) 造成了 {} 点伤害",
                            t.name, t.stacks, t.damage
                        ));
                        result.damage_by_status.insert(key.clone(), t.damage);
                        result.damage_dealt = result.damage_dealt.saturating_add(t.damage);
                    }
                    if t.healing > 0 {
                        result.effect_logs.push(format!(
                            "【{}】({}层) 恢复了 {} 点气血",
                            t.name, t.stacks, t.healing
                        ));
                        result.healing_done = result.healing_done.saturating_add(t.healing);
                    }
                }
                LogSlot::Expiry(name) => result.effect_logs.push(format!("【{}】效果消失", name)),
            }
        }

        self.remove_expired(&expired, ctx.now, &mut result);

        tracing::debug!(
            "Tick for {}: {} damage, {} healing, {} expired",
            target.unit_id,
            result.damage_dealt,
            result.healing_done,
            result.expired_status_ids.len()
        );
        result
    }

    fn remove_expired(&mut self, expired: &[usize], now: i64, result: &mut TickResult) {
        if expired.is_empty() {
            return;
        }

        let ids: Vec<String> = expired.iter().map(|&i| self.instances[i].id.clone()).collect();
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.instances)
            .into_iter()
            .partition(|i| ids.contains(&i.id));
        self.instances = kept;

        // Report in processing order, not storage order
        for id in &ids {
            let Some(instance) = gone.iter().find(|i| &i.id == id) else {
                continue;
            };
            self.ungroup(instance);
            tracing::debug!("Effect '{}' ({}) expired", instance.key, instance.id);
            self.push_event(ApplicationEvent::new(
                EventKind::Expired,
                instance.key.clone(),
                Some(instance.id.clone()),
                format!("【{}】效果消失", instance.name()),
                now,
            ));
            result.expired_status_ids.push(instance.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ApplicationRequest;
    use crate::persist::META_REMAINING_USES;
    use crate::registry::EffectRegistry;
    use rand::rngs::mock::StepRng;
    use std::sync::Arc;
    use unit_core::CasterSnapshot;

    fn target() -> UnitSnapshot {
        UnitSnapshot::new("u1", "南宫婉", 1000.0, 300.0)
            .with_attribute(Attribute::Vitality, 100.0)
            .with_attribute(Attribute::Willpower, 10.0)
    }

    fn container() -> StatusContainer {
        let registry = Arc::new(EffectRegistry::builtin().unwrap());
        StatusContainer::new(target().to_caster(), registry)
    }

    fn apply(c: &mut StatusContainer, request: ApplicationRequest) {
        let result = c.add_status_with_rng(request, &target(), &mut StepRng::new(u64::MAX, 0));
        assert!(result.success, "{}", result.message);
    }

    fn tick(c: &mut StatusContainer, now: i64) -> TickResult {
        let t = target();
        c.tick(&TickContext::new(&t).at(now))
    }

    #[test]
    fn test_stacked_dot_logs_once() {
        let mut c = container();
        for _ in 0..3 {
            apply(&mut c, ApplicationRequest::new("burn"));
        }
        let result = tick(&mut c, 0);
        assert_eq!(result.effect_logs.len(), 1);
        assert!(result.effect_logs[0].contains("3层"));
        assert!(result.damage_dealt > 0);
        assert_eq!(result.damage_by_status.get("burn"), Some(&result.damage_dealt));
    }

    #[test]
    fn test_independent_dots_merge_per_key() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("poison"));
        apply(&mut c, ApplicationRequest::new("poison"));
        let result = tick(&mut c, 0);
        let poison_lines: Vec<&String> =
            result.effect_logs.iter().filter(|l| l.contains("中毒")).collect();
        assert_eq!(poison_lines.len(), 1);
        assert!(poison_lines[0].contains("2层"));
    }

    #[test]
    fn test_turn_effects_expire_on_time() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("stun"));
        let result = tick(&mut c, 0);
        assert_eq!(result.expired_status_ids.len(), 1);
        assert!(c.is_empty());
        assert!(result.effect_logs.contains(&"【眩晕】效果消失".to_string()));
        assert_eq!(c.events().last().map(|e| e.kind), Some(EventKind::Expired));
    }

    #[test]
    fn test_control_expiry_logged_before_dot_damage() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("burn"));
        apply(&mut c, ApplicationRequest::new("stun"));
        let result = tick(&mut c, 0);
        assert_eq!(result.effect_logs[0], "【眩晕】效果消失");
        assert!(result.effect_logs[1].contains("灼烧"));
    }

    #[test]
    fn test_independent_instances_expire_independently() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("poison").with_duration(1));
        apply(&mut c, ApplicationRequest::new("poison").with_duration(2));
        let first = tick(&mut c, 0);
        assert_eq!(first.expired_status_ids.len(), 1);
        assert_eq!(c.stack_count("poison"), 1);
        tick(&mut c, 0);
        assert!(!c.has_status("poison"));
    }

    #[test]
    fn test_permanent_survives_ticks() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("inner_demon"));
        for _ in 0..20 {
            tick(&mut c, 0);
        }
        assert!(c.has_status("inner_demon"));
    }

    #[test]
    fn test_wall_clock_expiry() {
        let mut c = container();
        apply(&mut c, ApplicationRequest::new("pill_essence").at(0));
        tick(&mut c, 1_000);
        assert!(c.has_status("pill_essence"));
        let result = tick(&mut c, 3_600_000);
        assert_eq!(result.expired_status_ids.len(), 1);
        assert!(!c.has_status("pill_essence"));
    }

    #[test]
    fn test_exhausted_uses_expire_on_tick() {
        let mut c = container();
        apply(
            &mut c,
            ApplicationRequest::new("inner_demon").with_metadata(META_REMAINING_USES, 0),
        );
        let result = tick(&mut c, 0);
        assert_eq!(result.expired_status_ids.len(), 1);
    }

    #[test]
    fn test_healing_reduced_by_poison() {
        let mut healthy = container();
        apply(&mut healthy, ApplicationRequest::new("regeneration"));
        let full = tick(&mut healthy, 0).healing_done;

        let mut poisoned = container();
        apply(&mut poisoned, ApplicationRequest::new("regeneration"));
        apply(&mut poisoned, ApplicationRequest::new("poison"));
        let reduced = tick(&mut poisoned, 0).healing_done;

        assert!(full > 0);
        assert!(reduced < full);
    }

    #[test]
    fn test_huge_dot_totals_saturate() {
        let mut c = container();
        let monster = CasterSnapshot::new("m1", "魔尊").with_attribute(Attribute::Spirit, 1e30);
        apply(&mut c, ApplicationRequest::new("poison").with_caster(monster.clone()));
        apply(&mut c, ApplicationRequest::new("poison").with_caster(monster));

        let result = tick(&mut c, 0);
        assert_eq!(result.damage_dealt, u64::MAX);
        assert_eq!(result.damage_by_status.get("poison"), Some(&u64::MAX));
    }

    #[test]
    fn test_empty_tick() {
        let mut c = container();
        let result = tick(&mut c, 0);
        assert_eq!(result, TickResult::default());
    }
}
