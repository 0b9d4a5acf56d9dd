//! Action blocking - which actions active effects deny

use crate::materialize::{EffectConfig, SubEffect};
use serde::{Deserialize, Serialize};

/// Action capability of a unit; any single denial keeps an action denied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBlockResult {
    pub can_act: bool,
    pub can_use_skill: bool,
    pub can_dodge: bool,
    /// Human-readable reasons, one per denying effect
    pub reasons: Vec<String>,
}

impl Default for ActionBlockResult {
    fn default() -> Self {
        ActionBlockResult {
            can_act: true,
            can_use_skill: true,
            can_dodge: true,
            reasons: Vec::new(),
        }
    }
}

impl ActionBlockResult {
    /// Combine by logical AND
    pub fn combine(&mut self, other: ActionBlockResult) {
        self.can_act &= other.can_act;
        self.can_use_skill &= other.can_use_skill;
        self.can_dodge &= other.can_dodge;
        self.reasons.extend(other.reasons);
    }

    pub fn is_unrestricted(&self) -> bool {
        self.can_act && self.can_use_skill && self.can_dodge
    }
}

/// Compute what one effect denies
pub fn calculate_action_block(config: &EffectConfig) -> ActionBlockResult {
    let mut result = ActionBlockResult::default();

    for effect in &config.effects {
        if let SubEffect::ActionBlock {
            blocks_action,
            blocks_skill,
            blocks_dodge,
        } = effect
        {
            let mut denied = Vec::new();
            if *blocks_action {
                result.can_act = false;
                denied.push("无法行动");
            }
            if *blocks_skill {
                result.can_use_skill = false;
                denied.push("无法施展功法");
            }
            if *blocks_dodge {
                result.can_dodge = false;
                denied.push("无法闪避");
            }
            if !denied.is_empty() {
                result
                    .reasons
                    .push(format!("【{}】{}", config.name, denied.join("，")));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{EffectCategory, EffectDuration, StackingPolicy};

    fn block(name: &str, action: bool, skill: bool, dodge: bool) -> EffectConfig {
        EffectConfig {
            key: name.to_string(),
            name: name.to_string(),
            description: String::new(),
            max_stacks: 1,
            duration: EffectDuration::Turns { value: 1 },
            stacking: StackingPolicy::Refresh,
            category: EffectCategory::Control,
            tags: Vec::new(),
            conflicts_with: Vec::new(),
            effects: vec![SubEffect::ActionBlock {
                blocks_action: action,
                blocks_skill: skill,
                blocks_dodge: dodge,
            }],
        }
    }

    #[test]
    fn test_default_is_unrestricted() {
        let result = ActionBlockResult::default();
        assert!(result.is_unrestricted());
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_stun_denies_everything() {
        let result = calculate_action_block(&block("眩晕", true, true, true));
        assert!(!result.can_act);
        assert!(!result.can_use_skill);
        assert!(!result.can_dodge);
        assert_eq!(result.reasons, vec!["【眩晕】无法行动，无法施展功法，无法闪避".to_string()]);
    }

    #[test]
    fn test_combine_is_logical_and() {
        let mut total = ActionBlockResult::default();
        total.combine(calculate_action_block(&block("封印", false, true, false)));
        total.combine(calculate_action_block(&block("缠绕", false, false, true)));
        assert!(total.can_act);
        assert!(!total.can_use_skill);
        assert!(!total.can_dodge);
        assert_eq!(total.reasons.len(), 2);

        // A permissive effect never re-enables a denied action
        total.combine(ActionBlockResult::default());
        assert!(!total.can_use_skill);
    }

    #[test]
    fn test_empty_block_has_no_reason() {
        let result = calculate_action_block(&block("虚", false, false, false));
        assert!(result.is_unrestricted());
        assert!(result.reasons.is_empty());
    }
}
