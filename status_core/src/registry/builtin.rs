//! Built-in cultivation effect catalog, embedded at compile time

pub(super) const BUILTIN_EFFECTS: &str = include_str!("../../config/effects.toml");
