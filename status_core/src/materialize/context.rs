use std::collections::BTreeMap;
use unit_core::{CasterSnapshot, QualityTier};

/// Parameter overrides keyed by sub-effect index, then parameter name
pub type ParamOverrides = BTreeMap<usize, BTreeMap<String, f64>>;

/// Inputs that turn a template into concrete numbers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializationContext {
    pub caster: Option<CasterSnapshot>,
    pub quality: Option<QualityTier>,
    /// Defaults to 1 when absent
    pub stacks: Option<u32>,
    pub overrides: ParamOverrides,
}

impl MaterializationContext {
    pub fn new() -> Self {
        MaterializationContext::default()
    }

    pub fn with_caster(mut self, caster: CasterSnapshot) -> Self {
        self.caster = Some(caster);
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = Some(stacks);
        self
    }

    /// Replace the base of one parameter of one sub-effect
    pub fn with_override(mut self, index: usize, param: impl Into<String>, value: f64) -> Self {
        self.overrides.entry(index).or_default().insert(param.into(), value);
        self
    }

    pub fn stack_count(&self) -> u32 {
        self.stacks.unwrap_or(1)
    }
}
