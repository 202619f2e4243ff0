//! Effect Aggregation
//!
//! Pure computations from (catalog, roster) to display summaries. Nothing is
//! cached: callers recompute after every roster or catalog change.
//!
//! Two identity rules apply and they differ on purpose:
//! - Group summaries deduplicate by `(name, type)` within a single group.
//! - Raid summaries deduplicate by `name` alone across the whole catalog;
//!   the first catalog occurrence fixes the reported type and description.

use crate::catalog::Catalog;
use crate::constants::GROUP_COUNT;
use crate::roster::{GroupId, Roster};
use crate::specialization::{EffectType, Specialization};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Group effects
// ============================================================================

/// One deduplicated group-scope effect with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEffectEntry {
    pub name: String,
    pub effect_type: EffectType,
    pub description: String,
    pub icon_path: String,
    pub count: u32,
}

impl GroupEffectEntry {
    /// Tooltip text: the description, suffixed with the count when stacked
    pub fn display_description(&self) -> String {
        if self.count > 1 {
            format!("{} ({})", self.description, self.count)
        } else {
            self.description.clone()
        }
    }
}

/// Group-scope effects active in one group, ordered by name then type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEffectSummary {
    pub entries: Vec<GroupEffectEntry>,
}

impl GroupEffectSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str, effect_type: EffectType) -> Option<&GroupEffectEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.effect_type == effect_type)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

/// Deduplicated group-scope effects for every group 1..=8
pub fn compute_group_effects(roster: &Roster) -> BTreeMap<GroupId, GroupEffectSummary> {
    (1..=GROUP_COUNT)
        .map(|group| (group, compute_single_group(roster, group)))
        .collect()
}

fn compute_single_group(roster: &Roster, group: GroupId) -> GroupEffectSummary {
    let mut merged: BTreeMap<(String, EffectType), GroupEffectEntry> = BTreeMap::new();

    for (_, spec) in roster.group(group) {
        for effect in spec.group_effects() {
            merged
                .entry((effect.name.clone(), effect.effect_type))
                .and_modify(|entry| entry.count += 1)
                .or_insert_with(|| GroupEffectEntry {
                    name: effect.name.clone(),
                    effect_type: effect.effect_type,
                    description: effect.description.clone(),
                    icon_path: effect.icon_path.clone(),
                    count: 1,
                });
        }
    }

    GroupEffectSummary {
        entries: merged.into_values().collect(),
    }
}

// ============================================================================
// Raid effects
// ============================================================================

/// Whether a raid effect is currently provided or only available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectStatus {
    Active,
    Available,
}

impl EffectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Available => "available",
        }
    }
}

/// A raid-scope effect known to the catalog, annotated with live counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEffectSummary {
    pub name: String,
    pub effect_type: EffectType,
    pub description: String,
    /// Occurrences among assigned specializations
    pub count: u32,
    /// Assigned specializations currently providing the effect
    pub sources: BTreeSet<String>,
    /// Catalog specializations that could provide the effect
    pub available_from: BTreeSet<String>,
}

impl RaidEffectSummary {
    pub fn status(&self) -> EffectStatus {
        if self.count > 0 {
            EffectStatus::Active
        } else {
            EffectStatus::Available
        }
    }

    /// Who to list in a tooltip: current providers when active,
    /// otherwise the specializations that could provide it
    pub fn display_sources(&self) -> Vec<&str> {
        let names = match self.status() {
            EffectStatus::Active => &self.sources,
            EffectStatus::Available => &self.available_from,
        };
        names.iter().map(String::as_str).collect()
    }
}

/// Every raid-scope effect name in the catalog, ordered by name, with counts
/// and sources taken from the roster. Effects nobody is assigned to appear
/// with `count == 0`. When a name appears with differing types, the first
/// occurrence in catalog order (class, then name) fixes type and description.
pub fn compute_raid_effects(catalog: &Catalog, roster: &Roster) -> Vec<RaidEffectSummary> {
    let mut known: BTreeMap<String, RaidEffectSummary> = BTreeMap::new();

    // Pass 1: everything the catalog could provide
    for spec in catalog.iter() {
        for effect in spec.raid_effects() {
            known
                .entry(effect.name.clone())
                .or_insert_with(|| RaidEffectSummary {
                    name: effect.name.clone(),
                    effect_type: effect.effect_type,
                    description: effect.description.clone(),
                    count: 0,
                    sources: BTreeSet::new(),
                    available_from: BTreeSet::new(),
                })
                .available_from
                .insert(spec.name.clone());
        }
    }

    // Pass 2: what the roster actually provides
    for (_, spec) in roster.occupied() {
        for effect in spec.raid_effects() {
            if let Some(summary) = known.get_mut(&effect.name) {
                summary.count += 1;
                summary.sources.insert(spec.name.clone());
            }
        }
    }

    known.into_values().collect()
}

/// Raid effects split by type, each partition ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEffectsByType {
    pub buff: Vec<RaidEffectSummary>,
    pub debuff: Vec<RaidEffectSummary>,
    pub other: Vec<RaidEffectSummary>,
}

impl RaidEffectsByType {
    pub fn get(&self, effect_type: EffectType) -> &[RaidEffectSummary] {
        match effect_type {
            EffectType::Buff => &self.buff,
            EffectType::Debuff => &self.debuff,
            EffectType::Other => &self.other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaidEffectSummary> {
        self.buff.iter().chain(&self.debuff).chain(&self.other)
    }
}

pub fn partition_by_type(effects: &[RaidEffectSummary]) -> RaidEffectsByType {
    let mut parts = RaidEffectsByType::default();
    for effect in effects {
        let bucket = match effect.effect_type {
            EffectType::Buff => &mut parts.buff,
            EffectType::Debuff => &mut parts.debuff,
            EffectType::Other => &mut parts.other,
        };
        bucket.push(effect.clone());
    }
    for bucket in [&mut parts.buff, &mut parts.debuff, &mut parts.other] {
        bucket.sort_by(|a, b| a.name.cmp(&b.name));
    }
    parts
}

/// "Active Effects: N / M" header numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEffectStats {
    pub active: usize,
    pub total: usize,
}

impl RaidEffectStats {
    pub fn of(effects: &[RaidEffectSummary]) -> Self {
        Self {
            active: effects.iter().filter(|e| e.count > 0).count(),
            total: effects.len(),
        }
    }
}

// ============================================================================
// Per-specialization breakdown
// ============================================================================

/// Group/raid effect counts shown on a specialization card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectBreakdown {
    pub group: usize,
    pub raid: usize,
}

impl EffectBreakdown {
    pub fn of(spec: &Specialization) -> Self {
        Self {
            group: spec.group_effects().count(),
            raid: spec.raid_effects().count(),
        }
    }

    pub fn label(&self) -> String {
        let plural = |n: usize| if n > 1 { "s" } else { "" };
        match (self.group, self.raid) {
            (0, 0) => "No effects".to_string(),
            (g, 0) => format!("{g} group effect{}", plural(g)),
            (0, r) => format!("{r} raid effect{}", plural(r)),
            (g, r) => format!("{g} group, {r} raid effects"),
        }
    }
}

// ============================================================================
// Full view
// ============================================================================

/// Everything a presentation layer needs after a roster change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSummary {
    pub groups: BTreeMap<GroupId, GroupEffectSummary>,
    pub raid: RaidEffectsByType,
    pub stats: RaidEffectStats,
}

pub fn summarize(catalog: &Catalog, roster: &Roster) -> CompositionSummary {
    let raid = compute_raid_effects(catalog, roster);
    CompositionSummary {
        groups: compute_group_effects(roster),
        stats: RaidEffectStats::of(&raid),
        raid: partition_by_type(&raid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Position;
    use crate::specialization::{Effect, EffectScope};

    fn effect(name: &str, t: EffectType, s: EffectScope) -> Effect {
        Effect::new(name, t, s, format!("{name} description"))
    }

    fn catalog() -> Catalog {
        Catalog::load(vec![
            Specialization::new("Fury Warrior", "Warrior", "icons/w.png")
                .with_effect(effect("Battle Shout", EffectType::Buff, EffectScope::Raid))
                .with_effect(effect("Sunder Armor", EffectType::Debuff, EffectScope::Raid)),
            Specialization::new("Retribution Paladin", "Paladin", "icons/p.png")
                .with_effect(effect("Devotion Aura", EffectType::Buff, EffectScope::Group))
                .with_effect(effect("Judgement", EffectType::Debuff, EffectScope::Raid)),
            Specialization::new("Protection Paladin", "Paladin", "icons/pp.png")
                .with_effect(effect("Devotion Aura", EffectType::Buff, EffectScope::Group)),
            Specialization::new("Enhancement Shaman", "Shaman", "icons/s.png")
                .with_effect(effect("Windfury Totem", EffectType::Buff, EffectScope::Group))
                .with_effect(effect("Mana Tide", EffectType::Other, EffectScope::Group)),
            Specialization::new("Balance Druid", "Druid", "icons/d.png"),
        ])
        .unwrap()
    }

    fn pos(g: u32, s: u32) -> Position {
        Position::new(g, s).unwrap()
    }

    #[test]
    fn test_every_group_present() {
        let groups = compute_group_effects(&Roster::new());
        assert_eq!(groups.len(), GROUP_COUNT as usize);
        assert!(groups.values().all(GroupEffectSummary::is_empty));
    }

    #[test]
    fn test_group_dedup_counts() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(1, 1), "Retribution Paladin", &catalog);
        roster.assign(pos(1, 2), "Protection Paladin", &catalog);

        let groups = compute_group_effects(&roster);
        let g1 = &groups[&1];
        assert_eq!(g1.len(), 1);
        let aura = g1.get("Devotion Aura", EffectType::Buff).unwrap();
        assert_eq!(aura.count, 2);
        assert_eq!(aura.display_description(), "Devotion Aura description (2)");
    }

    #[test]
    fn test_groups_are_independent() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(3, 1), "Enhancement Shaman", &catalog);

        let groups = compute_group_effects(&roster);
        assert_eq!(groups[&3].len(), 2);
        assert!(groups[&5].is_empty());
    }

    #[test]
    fn test_group_summary_sorted_and_raid_effects_excluded() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(2, 1), "Enhancement Shaman", &catalog);
        roster.assign(pos(2, 2), "Fury Warrior", &catalog);

        let names: Vec<_> = compute_group_effects(&roster)[&2]
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(names, vec!["Mana Tide", "Windfury Totem"]);
    }

    #[test]
    fn test_raid_effects_cover_catalog() {
        let catalog = catalog();
        let raid = compute_raid_effects(&catalog, &Roster::new());
        let names: Vec<_> = raid.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Battle Shout", "Judgement", "Sunder Armor"]);
        assert!(raid.iter().all(|e| e.count == 0 && e.sources.is_empty()));
        assert!(raid.iter().all(|e| e.status() == EffectStatus::Available));
    }

    #[test]
    fn test_raid_counts_and_sources() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(1, 1), "Fury Warrior", &catalog);
        roster.assign(pos(4, 3), "Fury Warrior", &catalog);

        let raid = compute_raid_effects(&catalog, &roster);
        let shout = raid.iter().find(|e| e.name == "Battle Shout").unwrap();
        assert_eq!(shout.count, 2);
        assert_eq!(shout.display_sources(), vec!["Fury Warrior"]);

        let judgement = raid.iter().find(|e| e.name == "Judgement").unwrap();
        assert_eq!(judgement.count, 0);
        assert_eq!(judgement.display_sources(), vec!["Retribution Paladin"]);
    }

    #[test]
    fn test_partition_and_stats() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(1, 1), "Fury Warrior", &catalog);

        let raid = compute_raid_effects(&catalog, &roster);
        let parts = partition_by_type(&raid);
        assert_eq!(parts.get(EffectType::Buff).len(), 1);
        let debuffs: Vec<_> = parts.debuff.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(debuffs, vec!["Judgement", "Sunder Armor"]);
        assert!(parts.other.is_empty());
        assert_eq!(parts.iter().count(), 3);

        assert_eq!(RaidEffectStats::of(&raid), RaidEffectStats { active: 2, total: 3 });
    }

    #[test]
    fn test_repeated_effect_in_one_spec_counts_twice() {
        let catalog = Catalog::load(vec![Specialization::new("Odd", "Test", "icons/o.png")
            .with_effect(effect("Echo", EffectType::Buff, EffectScope::Group))
            .with_effect(effect("Echo", EffectType::Buff, EffectScope::Group))
            .with_effect(effect("Boom", EffectType::Buff, EffectScope::Raid))
            .with_effect(effect("Boom", EffectType::Buff, EffectScope::Raid))])
        .unwrap();
        let mut roster = Roster::new();
        roster.assign(pos(1, 1), "Odd", &catalog);

        assert_eq!(compute_group_effects(&roster)[&1].entries[0].count, 2);
        let raid = compute_raid_effects(&catalog, &roster);
        assert_eq!(raid.len(), 1);
        assert_eq!(raid[0].count, 2);
        assert_eq!(raid[0].sources.len(), 1);
    }

    #[test]
    fn test_zero_effect_spec_contributes_nothing() {
        let catalog = catalog();
        let mut roster = Roster::new();
        roster.assign(pos(6, 1), "Balance Druid", &catalog);
        let summary = summarize(&catalog, &roster);
        assert!(summary.groups[&6].is_empty());
        assert_eq!(summary.stats.active, 0);
    }

    #[test]
    fn test_breakdown_labels() {
        let catalog = catalog();
        let label = |name: &str| EffectBreakdown::of(catalog.get(name).unwrap()).label();
        assert_eq!(label("Fury Warrior"), "2 raid effects");
        assert_eq!(label("Protection Paladin"), "1 group effect");
        assert_eq!(label("Retribution Paladin"), "1 group, 1 raid effects");
        assert_eq!(label("Enhancement Shaman"), "2 group effects");
        assert_eq!(label("Balance Druid"), "No effects");
    }
}
