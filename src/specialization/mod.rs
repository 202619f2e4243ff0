//! Specialization & Effect records
//!
//! A specialization is a selectable character build (e.g. "Arms Warrior")
//! that provides a fixed, ordered list of effects. Effects are qualitative:
//! a name, a kind (buff/debuff/other) and a scope (raid-wide or group-wide).
//! Records are immutable once loaded and shared by `Arc` between the catalog
//! and the roster.

use serde::{Deserialize, Serialize};

/// Kind of gameplay effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    Buff,
    Debuff,
    Other,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buff => "buff",
            Self::Debuff => "debuff",
            Self::Other => "other",
        }
    }

    /// Heading used when raid effects are grouped by type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Buff => "Buffs",
            Self::Debuff => "Debuffs",
            Self::Other => "Util",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buff" => Some(Self::Buff),
            "debuff" => Some(Self::Debuff),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn all() -> [EffectType; 3] {
        [Self::Buff, Self::Debuff, Self::Other]
    }
}

/// Who benefits from an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectScope {
    /// Applies to every member of the raid
    Raid,
    /// Applies only to the provider's own group
    Group,
}

impl EffectScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raid => "raid",
            Self::Group => "group",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "raid" => Some(Self::Raid),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

/// A single effect provided by a specialization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub scope: EffectScope,
    pub description: String,
    #[serde(default)]
    pub icon_path: String,
}

impl Effect {
    pub fn new(
        name: impl Into<String>,
        effect_type: EffectType,
        scope: EffectScope,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            effect_type,
            scope,
            description: description.into(),
            icon_path: String::new(),
        }
    }

    pub fn with_icon(mut self, icon_path: impl Into<String>) -> Self {
        self.icon_path = icon_path.into();
        self
    }

    pub fn is_raid(&self) -> bool {
        self.scope == EffectScope::Raid
    }

    pub fn is_group(&self) -> bool {
        self.scope == EffectScope::Group
    }
}

/// A selectable character build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub icon_path: String,
    pub effects: Vec<Effect>,
}

impl Specialization {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        icon_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            icon_path: icon_path.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn raid_effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|e| e.is_raid())
    }

    pub fn group_effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|e| e.is_group())
    }

    /// True when any effect in the list carries `effect_name`, regardless of scope
    pub fn provides(&self, effect_name: &str) -> bool {
        self.effects.iter().any(|e| e.name == effect_name)
    }

    /// True when any effect name is contained in `effect_names`
    pub fn provides_any<S: AsRef<str>>(&self, effect_names: &[S]) -> bool {
        self.effects
            .iter()
            .any(|e| effect_names.iter().any(|n| n.as_ref() == e.name))
    }
}
