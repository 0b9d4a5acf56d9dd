use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a snake_case name into one of the unit enums
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("Unknown element: {0}")]
    UnknownElement(String),
    #[error("Unknown quality tier: {0}")]
    UnknownQuality(String),
}

/// Core cultivator attributes used for scaling and calculator inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Agility,
    Vitality,
    Spirit,
    Wisdom,
    Willpower,
    Defense,
}

impl Attribute {
    /// Get all attribute variants
    pub fn all() -> &'static [Attribute] {
        &[
            Attribute::Strength,
            Attribute::Agility,
            Attribute::Vitality,
            Attribute::Spirit,
            Attribute::Wisdom,
            Attribute::Willpower,
            Attribute::Defense,
        ]
    }

    /// snake_case identifier, as used in templates and scaling axes
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Strength => "strength",
            Attribute::Agility => "agility",
            Attribute::Vitality => "vitality",
            Attribute::Spirit => "spirit",
            Attribute::Wisdom => "wisdom",
            Attribute::Willpower => "willpower",
            Attribute::Defense => "defense",
        }
    }

    /// In-game label
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Strength => "力道",
            Attribute::Agility => "身法",
            Attribute::Vitality => "体魄",
            Attribute::Spirit => "灵力",
            Attribute::Wisdom => "悟性",
            Attribute::Willpower => "神识",
            Attribute::Defense => "护体",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Strength => write!(f, "Strength"),
            Attribute::Agility => write!(f, "Agility"),
            Attribute::Vitality => write!(f, "Vitality"),
            Attribute::Spirit => write!(f, "Spirit"),
            Attribute::Wisdom => write!(f, "Wisdom"),
            Attribute::Willpower => write!(f, "Willpower"),
            Attribute::Defense => write!(f, "Defense"),
        }
    }
}

impl FromStr for Attribute {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseError::UnknownAttribute(s.to_string()))
    }
}

/// A full attribute sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub agility: f64,
    #[serde(default)]
    pub vitality: f64,
    #[serde(default)]
    pub spirit: f64,
    #[serde(default)]
    pub wisdom: f64,
    #[serde(default)]
    pub willpower: f64,
    #[serde(default)]
    pub defense: f64,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes::default()
    }

    /// Read a single attribute
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Agility => self.agility,
            Attribute::Vitality => self.vitality,
            Attribute::Spirit => self.spirit,
            Attribute::Wisdom => self.wisdom,
            Attribute::Willpower => self.willpower,
            Attribute::Defense => self.defense,
        }
    }

    /// Mutable access to a single attribute
    pub fn get_mut(&mut self, attribute: Attribute) -> &mut f64 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Agility => &mut self.agility,
            Attribute::Vitality => &mut self.vitality,
            Attribute::Spirit => &mut self.spirit,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Willpower => &mut self.willpower,
            Attribute::Defense => &mut self.defense,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: f64) {
        *self.get_mut(attribute) = value;
    }

    /// Builder-style setter
    pub fn with(mut self, attribute: Attribute, value: f64) -> Self {
        self.set(attribute, value);
        self
    }
}

/// Elemental affinity of damage and amplification effects
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    #[default]
    Physical,
    Metal,
    Wood,
    Water,
    Fire,
    Earth,
    Thunder,
}

impl Element {
    /// Get all element variants
    pub fn all() -> &'static [Element] {
        &[
            Element::Physical,
            Element::Metal,
            Element::Wood,
            Element::Water,
            Element::Fire,
            Element::Earth,
            Element::Thunder,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Physical => "physical",
            Element::Metal => "metal",
            Element::Wood => "wood",
            Element::Water => "water",
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Thunder => "thunder",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Element::Physical => "物理",
            Element::Metal => "金",
            Element::Wood => "木",
            Element::Water => "水",
            Element::Fire => "火",
            Element::Earth => "土",
            Element::Thunder => "雷",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Physical => write!(f, "Physical"),
            Element::Metal => write!(f, "Metal"),
            Element::Wood => write!(f, "Wood"),
            Element::Water => write!(f, "Water"),
            Element::Fire => write!(f, "Fire"),
            Element::Earth => write!(f, "Earth"),
            Element::Thunder => write!(f, "Thunder"),
        }
    }
}

impl FromStr for Element {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::all()
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ParseError::UnknownElement(s.to_string()))
    }
}

/// Resource pools that effects can enlarge or shrink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// 气血
    Hp,
    /// 真元
    Mp,
}

/// Item / material quality grade, lowest to highest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    #[default]
    Common,
    Spirit,
    Treasure,
    Earth,
    Heaven,
    Divine,
}

impl QualityTier {
    /// Get all tiers, lowest first
    pub fn all() -> &'static [QualityTier] {
        &[
            QualityTier::Common,
            QualityTier::Spirit,
            QualityTier::Treasure,
            QualityTier::Earth,
            QualityTier::Heaven,
            QualityTier::Divine,
        ]
    }

    /// Fixed scaling multiplier, strictly increasing with tier
    pub fn multiplier(&self) -> f64 {
        match self {
            QualityTier::Common => 1.0,
            QualityTier::Spirit => 1.25,
            QualityTier::Treasure => 1.5,
            QualityTier::Earth => 2.0,
            QualityTier::Heaven => 2.5,
            QualityTier::Divine => 3.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Common => "common",
            QualityTier::Spirit => "spirit",
            QualityTier::Treasure => "treasure",
            QualityTier::Earth => "earth",
            QualityTier::Heaven => "heaven",
            QualityTier::Divine => "divine",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Common => "凡品",
            QualityTier::Spirit => "灵品",
            QualityTier::Treasure => "宝品",
            QualityTier::Earth => "地品",
            QualityTier::Heaven => "天品",
            QualityTier::Divine => "仙品",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for QualityTier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityTier::all()
            .iter()
            .copied()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| ParseError::UnknownQuality(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_multipliers_strictly_increase() {
        let tiers = QualityTier::all();
        for pair in tiers.windows(2) {
            assert!(pair[1].multiplier() > pair[0].multiplier());
        }
    }

    #[test]
    fn test_attribute_from_str() {
        assert_eq!("spirit".parse::<Attribute>(), Ok(Attribute::Spirit));
        assert_eq!(
            "luck".parse::<Attribute>(),
            Err(ParseError::UnknownAttribute("luck".to_string()))
        );
    }

    #[test]
    fn test_attributes_get_set() {
        let attrs = Attributes::new()
            .with(Attribute::Spirit, 120.0)
            .with(Attribute::Willpower, 30.0);
        assert!((attrs.get(Attribute::Spirit) - 120.0).abs() < f64::EPSILON);
        assert!((attrs.get(Attribute::Willpower) - 30.0).abs() < f64::EPSILON);
        assert!((attrs.get(Attribute::Vitality) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enum_serialization() {
        let json = serde_json::to_string(&Element::Thunder).unwrap();
        assert_eq!(json, "\"thunder\"");
        let tier: QualityTier = serde_json::from_str("\"heaven\"").unwrap();
        assert_eq!(tier, QualityTier::Heaven);
    }

    #[test]
    fn test_partial_attribute_sheet_deserializes() {
        let attrs: Attributes = serde_json::from_str(r#"{"spirit": 50}"#).unwrap();
        assert!((attrs.spirit - 50.0).abs() < f64::EPSILON);
        assert!((attrs.wisdom - 0.0).abs() < f64::EPSILON);
    }
}
