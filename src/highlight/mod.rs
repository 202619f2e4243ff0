//! Highlight Resolution
//!
//! Hovering a specialization lights up the effects it provides; hovering an
//! effect lights up the specializations that provide it. Resolution is a
//! linear scan over the catalog and the 40 roster positions.
//!
//! Only one focus is active at a time. `Highlighter::focus` drops the
//! previous set entirely before applying the new one.

use crate::catalog::Catalog;
use crate::effects::{compute_group_effects, compute_raid_effects};
use crate::roster::{GroupId, Position, Roster};
use crate::specialization::Specialization;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// What the user is pointing at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    /// A specialization card or an assigned occupant
    Specialization(String),
    /// Any of a set of effect names, across the whole roster
    Effects(Vec<String>),
    /// A group effect indicator inside one group
    GroupEffect { name: String, group: GroupId },
    /// A raid effect line
    RaidEffect(String),
}

impl Focus {
    pub fn kind(&self) -> HighlightKind {
        match self {
            Self::Specialization(_) => HighlightKind::Effect,
            Self::Effects(_) => HighlightKind::Spec,
            Self::GroupEffect { .. } => HighlightKind::GroupEffect,
            Self::RaidEffect(_) => HighlightKind::RaidEffect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightKind {
    Spec,
    Effect,
    GroupEffect,
    RaidEffect,
}

impl HighlightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Effect => "effect",
            Self::GroupEffect => "group-effect",
            Self::RaidEffect => "raid-effect",
        }
    }

    /// Class applied to highlighted elements. Effect-driven focuses mark
    /// provider cards, so they share the spec styling.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Effect => "highlight-effect",
            Self::Spec | Self::GroupEffect | Self::RaidEffect => "highlight-spec",
        }
    }
}

/// An element that can be marked
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HighlightTarget {
    CatalogEntry(String),
    RosterPosition(Position),
    GroupEffectIndicator { group: GroupId, name: String },
    RaidEffectIndicator(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSet {
    pub kind: HighlightKind,
    pub targets: BTreeSet<HighlightTarget>,
}

impl HighlightSet {
    fn new(kind: HighlightKind) -> Self {
        Self {
            kind,
            targets: BTreeSet::new(),
        }
    }

    pub fn contains(&self, target: &HighlightTarget) -> bool {
        self.targets.contains(target)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn catalog_entries(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(|t| match t {
            HighlightTarget::CatalogEntry(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.targets.iter().filter_map(|t| match t {
            HighlightTarget::RosterPosition(pos) => Some(*pos),
            _ => None,
        })
    }
}

/// Compute the highlight set for a focus against the current state
pub fn resolve(focus: &Focus, catalog: &Catalog, roster: &Roster) -> HighlightSet {
    let mut set = HighlightSet::new(focus.kind());

    match focus {
        Focus::Specialization(name) => {
            let Some(spec) = catalog.get(name) else {
                return set;
            };
            let provided: HashSet<&str> = spec.effects.iter().map(|e| e.name.as_str()).collect();

            for (group, summary) in compute_group_effects(roster) {
                for entry in summary.entries {
                    if provided.contains(entry.name.as_str()) {
                        set.targets.insert(HighlightTarget::GroupEffectIndicator {
                            group,
                            name: entry.name,
                        });
                    }
                }
            }
            for raid in compute_raid_effects(catalog, roster) {
                if provided.contains(raid.name.as_str()) {
                    set.targets
                        .insert(HighlightTarget::RaidEffectIndicator(raid.name));
                }
            }
        }
        Focus::Effects(names) => {
            if names.is_empty() {
                return set;
            }
            mark_catalog_providers(&mut set, catalog, |spec| spec.provides_any(names.as_slice()));
            for (pos, spec) in roster.occupied() {
                if spec.provides_any(names.as_slice()) {
                    set.targets.insert(HighlightTarget::RosterPosition(pos));
                }
            }
        }
        Focus::GroupEffect { name, group } => {
            for (pos, spec) in roster.group(*group) {
                if spec.provides(name) {
                    set.targets.insert(HighlightTarget::RosterPosition(pos));
                }
            }
            mark_catalog_providers(&mut set, catalog, |spec| spec.provides(name));
        }
        Focus::RaidEffect(name) => {
            for (pos, spec) in roster.occupied() {
                if spec.provides(name) {
                    set.targets.insert(HighlightTarget::RosterPosition(pos));
                }
            }
            mark_catalog_providers(&mut set, catalog, |spec| spec.provides(name));
        }
    }

    set
}

fn mark_catalog_providers(
    set: &mut HighlightSet,
    catalog: &Catalog,
    matches: impl Fn(&Specialization) -> bool,
) {
    for spec in catalog.iter() {
        if matches(&**spec) {
            set.targets
                .insert(HighlightTarget::CatalogEntry(spec.name.clone()));
        }
    }
}

/// Holds the single active focus and its resolved highlight set
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    active: Option<(Focus, HighlightSet)>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any previous focus with `focus`
    pub fn focus(&mut self, focus: Focus, catalog: &Catalog, roster: &Roster) -> &HighlightSet {
        self.active = None;
        let set = resolve(&focus, catalog, roster);
        &self.active.insert((focus, set)).1
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Re-resolve the active focus after a roster or catalog change
    pub fn refresh(&mut self, catalog: &Catalog, roster: &Roster) {
        if let Some((focus, set)) = self.active.as_mut() {
            *set = resolve(focus, catalog, roster);
        }
    }

    pub fn active_focus(&self) -> Option<&Focus> {
        self.active.as_ref().map(|(focus, _)| focus)
    }

    pub fn current(&self) -> Option<&HighlightSet> {
        self.active.as_ref().map(|(_, set)| set)
    }

    pub fn is_highlighted(&self, target: &HighlightTarget) -> bool {
        self.current().is_some_and(|set| set.contains(target))
    }
}
