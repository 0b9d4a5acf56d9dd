//! Effect template loading from TOML files

use super::{load_toml, parse_toml, ConfigError};
use crate::registry::{EffectRegistry, EffectTemplate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of one template file: a `[[template]]` array
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateFile {
    #[serde(rename = "template", default)]
    pub effects: Vec<EffectTemplate>,
}

/// Parse templates from a TOML string
pub fn parse_templates(content: &str, origin: &str) -> Result<TemplateFile, ConfigError> {
    let file: TemplateFile = parse_toml(content, origin)?;
    validate(&file, Path::new(origin))?;
    Ok(file)
}

/// Load a single template file into a new registry
pub fn load_templates_file(path: &Path) -> Result<EffectRegistry, ConfigError> {
    let mut registry = EffectRegistry::new();
    load_file(&mut registry, path)?;
    Ok(registry)
}

/// Load every `.toml` file under a directory (recursively) into a new registry
///
/// A missing directory yields an empty registry.
pub fn load_templates_dir(dir: &Path) -> Result<EffectRegistry, ConfigError> {
    let mut registry = EffectRegistry::new();
    load_dir(&mut registry, dir)?;
    Ok(registry)
}

fn load_dir(registry: &mut EffectRegistry, dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        return Ok(());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
        error: e,
        path: Some(dir.to_path_buf()),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })?;
        paths.push(entry.path());
    }
    // read_dir order is platform-dependent; sort so "last registration wins" is stable
    paths.sort();

    for path in paths {
        if path.is_dir() {
            load_dir(registry, &path)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            load_file(registry, &path)?;
        }
    }

    Ok(())
}

fn load_file(registry: &mut EffectRegistry, path: &Path) -> Result<(), ConfigError> {
    let file: TemplateFile = load_toml(path)?;
    validate(&file, path)?;
    tracing::debug!("Loaded {} effect templates from {:?}", file.effects.len(), path);
    registry.extend(file.effects);
    Ok(())
}

fn validate(file: &TemplateFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(template) = file.effects.iter().find(|t| t.key.trim().is_empty()) {
        return Err(ConfigError::Validation {
            message: format!("template '{}' has an empty key", template.name),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
