//! End-to-end composition scenarios
//!
//! Builds small catalogs, assigns a roster and checks the aggregated group
//! and raid views, highlighting and persistence together.

use raid_core::effects::{compute_group_effects, compute_raid_effects, summarize, EffectStatus};
use raid_core::highlight::{resolve, HighlightKind, HighlightTarget};
use raid_core::snapshot::{self, load_composition, save_composition, MemoryStore, SnapshotStore};
use raid_core::{
    Catalog, Effect, EffectScope, EffectType, Focus, PlannerSession, Position, Roster,
    Specialization,
};

// ============================================================
// Helpers
// ============================================================

fn pos(group: u32, slot: u32) -> Position {
    Position::new(group, slot).unwrap()
}

fn effect(name: &str, effect_type: EffectType, scope: EffectScope) -> Effect {
    let slug: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    Effect::new(name, effect_type, scope, format!("{name} description"))
        .with_icon(format!("raidicons/{slug}.png"))
}

/// Warrior / Priest / Paladin catalog used by the reference scenario
fn scenario_catalog() -> Catalog {
    Catalog::load(vec![
        Specialization::new("Warrior", "Warrior", "icons/warrior.png").with_effect(effect(
            "Battle Shout",
            EffectType::Buff,
            EffectScope::Raid,
        )),
        Specialization::new("Priest", "Priest", "icons/priest.png").with_effect(effect(
            "Power Word: Fortitude",
            EffectType::Buff,
            EffectScope::Raid,
        )),
        Specialization::new("Paladin", "Paladin", "icons/paladin.png").with_effect(effect(
            "Devotion Aura",
            EffectType::Buff,
            EffectScope::Group,
        )),
    ])
    .unwrap()
}

fn scenario_roster(catalog: &Catalog) -> Roster {
    let mut roster = Roster::new();
    roster.assign(pos(1, 1), "Warrior", catalog);
    roster.assign(pos(2, 1), "Warrior", catalog);
    roster.assign(pos(1, 2), "Paladin", catalog);
    roster
}

// ============================================================
// Reference scenario
// ============================================================

#[test]
fn scenario_raid_and_group_effects() {
    let catalog = scenario_catalog();
    let roster = scenario_roster(&catalog);

    let raid = compute_raid_effects(&catalog, &roster);
    assert_eq!(raid.len(), 2);

    let shout = raid.iter().find(|e| e.name == "Battle Shout").unwrap();
    assert_eq!(shout.count, 2);
    assert_eq!(shout.sources.iter().collect::<Vec<_>>(), vec!["Warrior"]);
    assert_eq!(shout.available_from.iter().collect::<Vec<_>>(), vec!["Warrior"]);
    assert_eq!(shout.status(), EffectStatus::Active);

    let fort = raid
        .iter()
        .find(|e| e.name == "Power Word: Fortitude")
        .unwrap();
    assert_eq!(fort.count, 0);
    assert!(fort.sources.is_empty());
    assert_eq!(fort.available_from.iter().collect::<Vec<_>>(), vec!["Priest"]);
    assert_eq!(fort.status(), EffectStatus::Available);
    assert_eq!(fort.display_sources(), vec!["Priest"]);

    let groups = compute_group_effects(&roster);
    assert_eq!(groups.len(), 8);
    let group1 = &groups[&1];
    assert_eq!(group1.len(), 1);
    assert_eq!(
        group1.get("Devotion Aura", EffectType::Buff).unwrap().count,
        1
    );
    assert!(groups[&2].is_empty());
}

#[test]
fn scenario_summary_stats() {
    let catalog = scenario_catalog();
    let summary = summarize(&catalog, &scenario_roster(&catalog));
    assert_eq!(summary.stats.active, 1);
    assert_eq!(summary.stats.total, 2);
    assert_eq!(summary.raid.buff.len(), 2);
    assert!(summary.raid.debuff.is_empty());
}

// ============================================================
// Deduplication rules
// ============================================================

#[test]
fn group_effect_dedup_counts_providers() {
    let catalog = scenario_catalog();
    let mut roster = Roster::new();
    roster.assign(pos(3, 1), "Paladin", &catalog);
    roster.assign(pos(3, 4), "Paladin", &catalog);
    roster.assign(pos(4, 1), "Paladin", &catalog);

    let groups = compute_group_effects(&roster);
    let aura = groups[&3].get("Devotion Aura", EffectType::Buff).unwrap();
    assert_eq!(aura.count, 2);
    assert_eq!(aura.display_description(), "Devotion Aura description (2)");
    assert_eq!(groups[&4].entries[0].count, 1);
}

#[test]
fn raid_identity_is_name_group_identity_is_name_and_type() {
    let catalog = Catalog::load(vec![
        Specialization::new("Feral Druid", "Druid", "icons/d.png")
            .with_effect(effect("Totem", EffectType::Buff, EffectScope::Raid))
            .with_effect(effect("Pack", EffectType::Buff, EffectScope::Group)),
        Specialization::new("Enhancement Shaman", "Shaman", "icons/s.png")
            .with_effect(effect("Totem", EffectType::Debuff, EffectScope::Raid))
            .with_effect(effect("Pack", EffectType::Other, EffectScope::Group)),
    ])
    .unwrap();

    let mut roster = Roster::new();
    roster.assign(pos(1, 1), "Feral Druid", &catalog);
    roster.assign(pos(1, 2), "Enhancement Shaman", &catalog);

    let raid = compute_raid_effects(&catalog, &roster);
    assert_eq!(raid.len(), 1);
    assert_eq!(raid[0].name, "Totem");
    assert_eq!(raid[0].count, 2);
    assert_eq!(raid[0].sources.len(), 2);
    // First catalog occurrence (by class, then name) fixes the type
    assert_eq!(raid[0].effect_type, EffectType::Buff);

    let groups = compute_group_effects(&roster);
    assert_eq!(groups[&1].len(), 2);
    assert!(groups[&1].get("Pack", EffectType::Buff).is_some());
    assert!(groups[&1].get("Pack", EffectType::Other).is_some());
}

#[test]
fn completeness_lists_every_catalog_raid_effect() {
    let catalog = scenario_catalog();
    let raid = compute_raid_effects(&catalog, &Roster::new());
    let names: Vec<_> = raid.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Battle Shout", "Power Word: Fortitude"]);
    assert!(raid.iter().all(|e| e.count == 0));
}

#[test]
fn duplicated_effect_within_one_spec_counts_twice() {
    let catalog = Catalog::load(vec![Specialization::new("Odd", "Odd", "icons/o.png")
        .with_effect(effect("Echo", EffectType::Buff, EffectScope::Group))
        .with_effect(effect("Echo", EffectType::Buff, EffectScope::Group))])
    .unwrap();
    let mut roster = Roster::new();
    roster.assign(pos(5, 5), "Odd", &catalog);
    assert_eq!(
        compute_group_effects(&roster)[&5]
            .get("Echo", EffectType::Buff)
            .unwrap()
            .count,
        2
    );
}

// ============================================================
// Roster moves
// ============================================================

#[test]
fn move_is_atomic() {
    let catalog = scenario_catalog();
    let mut roster = scenario_roster(&catalog);
    let before = roster.clone();

    assert!(roster.move_occupant(pos(1, 1), pos(7, 3)));
    assert!(roster.occupant_at(pos(1, 1)).is_none());
    assert_eq!(roster.occupant_at(pos(7, 3)).unwrap().name, "Warrior");
    for p in Position::all() {
        if p != pos(1, 1) && p != pos(7, 3) {
            assert_eq!(
                roster.occupant_at(p).map(|s| s.name.clone()),
                before.occupant_at(p).map(|s| s.name.clone()),
                "position {p} changed"
            );
        }
    }
}

// ============================================================
// Highlighting
// ============================================================

#[test]
fn highlight_never_marks_other_specializations() {
    let catalog = Catalog::load(vec![
        Specialization::new("Holy Paladin", "Paladin", "icons/a.png")
            .with_effect(effect("Aura", EffectType::Buff, EffectScope::Group)),
        Specialization::new("Protection Paladin", "Paladin", "icons/b.png")
            .with_effect(effect("Aura", EffectType::Buff, EffectScope::Group)),
    ])
    .unwrap();
    let mut roster = Roster::new();
    roster.assign(pos(1, 1), "Holy Paladin", &catalog);
    roster.assign(pos(1, 2), "Protection Paladin", &catalog);

    let set = resolve(
        &Focus::Specialization("Holy Paladin".into()),
        &catalog,
        &roster,
    );
    assert_eq!(set.kind, HighlightKind::Effect);
    assert!(set.contains(&HighlightTarget::GroupEffectIndicator {
        group: 1,
        name: "Aura".into()
    }));
    assert_eq!(set.catalog_entries().count(), 0);
    assert_eq!(set.positions().count(), 0);
}

#[test]
fn raid_effect_focus_marks_providers_everywhere() {
    let catalog = scenario_catalog();
    let roster = scenario_roster(&catalog);

    let set = resolve(&Focus::RaidEffect("Battle Shout".into()), &catalog, &roster);
    let positions: Vec<_> = set.positions().collect();
    assert_eq!(positions, vec![pos(1, 1), pos(2, 1)]);
    assert_eq!(set.catalog_entries().collect::<Vec<_>>(), vec!["Warrior"]);
    assert!(!set.contains(&HighlightTarget::RaidEffectIndicator(
        "Battle Shout".into()
    )));
}

#[test]
fn group_effect_focus_stays_in_group() {
    let catalog = scenario_catalog();
    let mut roster = scenario_roster(&catalog);
    roster.assign(pos(2, 2), "Paladin", &catalog);

    let set = resolve(
        &Focus::GroupEffect {
            name: "Devotion Aura".into(),
            group: 1,
        },
        &catalog,
        &roster,
    );
    assert_eq!(set.positions().collect::<Vec<_>>(), vec![pos(1, 2)]);
    assert_eq!(set.kind.css_class(), "highlight-spec");
}

// ============================================================
// Persistence
// ============================================================

#[test]
fn snapshot_round_trip_through_store() {
    let catalog = scenario_catalog();
    let roster = scenario_roster(&catalog);
    let mut store = MemoryStore::new();

    save_composition(&mut store, &roster).unwrap();
    let restored = load_composition(&mut store, &catalog).unwrap().unwrap();
    assert_eq!(restored.roster, roster);
}

#[test]
fn partial_corruption_places_valid_names_only() {
    let catalog = scenario_catalog();
    let blob = serde_json::json!({
        "version": "1.0",
        "timestamp": "2026-01-01T00:00:00Z",
        "groups": { "1": { "1": "Warrior", "2": "Retired Specialization" } }
    });
    let restored = snapshot::deserialize(&blob, &catalog).unwrap();
    assert_eq!(restored.roster.occupied_count(), 1);
    assert_eq!(restored.unresolved.len(), 1);
}

#[test]
fn session_reload_prunes_and_keeps_saved_copy() {
    let mut store = MemoryStore::new();
    let mut session = PlannerSession::new(scenario_catalog());
    session.assign(1, 1, "Warrior").unwrap();
    session.assign(1, 2, "Priest").unwrap();
    session.save(&mut store).unwrap();

    let reloaded = Catalog::load(vec![Specialization::new(
        "Priest",
        "Priest",
        "icons/priest.png",
    )])
    .unwrap();
    let dropped = session.replace_catalog(reloaded);
    assert_eq!(dropped, vec![(pos(1, 1), "Warrior".to_string())]);
    assert!(session.is_dirty());

    // The stored blob still names the removed spec; restoring skips it
    let unresolved = session.restore(&mut store).unwrap().unwrap();
    assert_eq!(unresolved, vec![(pos(1, 1), "Warrior".to_string())]);
    assert_eq!(session.roster().occupied_count(), 1);
    assert!(store.get("raidComposition").unwrap().is_some());
}
