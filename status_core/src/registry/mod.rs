//! Effect template registry

mod builtin;
mod template;

pub use template::{
    DotFlavor, EffectCategory, EffectDuration, EffectTag, EffectTemplate, ParamValue,
    ScalingAxis, StackingPolicy, SubEffectKind, SubEffectTemplate,
};

use crate::config::{parse_templates, ConfigError};
use std::collections::HashMap;

/// Catalog of effect templates
///
/// Built once at startup and shared read-only (usually behind an `Arc`)
/// by every container.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    /// Mapping from template key to template
    templates: HashMap<String, EffectTemplate>,
}

impl EffectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        EffectRegistry {
            templates: HashMap::new(),
        }
    }

    /// The built-in cultivation catalog
    pub fn builtin() -> Result<Self, ConfigError> {
        let file = parse_templates(builtin::BUILTIN_EFFECTS, "<builtin effects>")?;
        let mut registry = Self::new();
        registry.extend(file.effects);
        Ok(registry)
    }

    /// Register a template; a later registration under the same key wins
    pub fn register(&mut self, template: EffectTemplate) {
        if self.templates.contains_key(&template.key) {
            tracing::debug!("Replacing effect template '{}'", template.key);
        }
        self.templates.insert(template.key.clone(), template);
    }

    pub fn extend(&mut self, templates: impl IntoIterator<Item = EffectTemplate>) {
        for template in templates {
            self.register(template);
        }
    }

    /// Get a template by key
    pub fn get(&self, key: &str) -> Option<&EffectTemplate> {
        self.templates.get(key)
    }

    /// All templates carrying a tag, ordered by key
    pub fn get_by_tag(&self, tag: EffectTag) -> Vec<&EffectTemplate> {
        let mut found: Vec<&EffectTemplate> =
            self.templates.values().filter(|t| t.has_tag(tag)).collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        found
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// List all template keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
