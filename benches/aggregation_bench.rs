use criterion::{black_box, criterion_group, criterion_main, Criterion};
use raid_core::effects::{compute_group_effects, compute_raid_effects, summarize};
use raid_core::highlight::resolve;
use raid_core::snapshot::{deserialize_str, serialize};
use raid_core::{
    Catalog, Effect, EffectScope, EffectType, Focus, Position, Roster, Specialization,
};

/// 28 specializations with a handful of effects each, shared names included
fn catalog() -> Catalog {
    let classes = ["Druid", "Hunter", "Mage", "Paladin", "Priest", "Rogue", "Shaman"];
    let mut specs = Vec::new();
    for (c, class) in classes.iter().enumerate() {
        for n in 0..4 {
            let mut spec = Specialization::new(
                format!("{class} {n}"),
                *class,
                format!("icons/{}/{n}.png", class.to_lowercase()),
            );
            for e in 0..4 {
                let scope = if e % 2 == 0 {
                    EffectScope::Raid
                } else {
                    EffectScope::Group
                };
                let id = (c + n + e) % 12;
                spec = spec.with_effect(
                    Effect::new(format!("Effect {id}"), EffectType::all()[e % 3], scope, "bench")
                        .with_icon(format!("raidicons/effect_{id}.png")),
                );
            }
            specs.push(spec);
        }
    }
    Catalog::load(specs).unwrap()
}

fn full_roster(catalog: &Catalog) -> Roster {
    let names: Vec<String> = catalog.names().map(str::to_string).collect();
    let mut roster = Roster::new();
    for (i, pos) in Position::all().enumerate() {
        roster.assign(pos, &names[i % names.len()], catalog);
    }
    roster
}

fn bench_aggregation(c: &mut Criterion) {
    let catalog = catalog();
    let roster = full_roster(&catalog);

    c.bench_function("compute_group_effects_full", |b| {
        b.iter(|| compute_group_effects(black_box(&roster)))
    });

    c.bench_function("compute_raid_effects_full", |b| {
        b.iter(|| compute_raid_effects(black_box(&catalog), black_box(&roster)))
    });

    c.bench_function("summarize_full", |b| {
        b.iter(|| summarize(black_box(&catalog), black_box(&roster)))
    });
}

fn bench_highlight(c: &mut Criterion) {
    let catalog = catalog();
    let roster = full_roster(&catalog);

    c.bench_function("resolve_raid_effect_focus", |b| {
        b.iter(|| {
            resolve(
                black_box(&Focus::RaidEffect("Effect 4".into())),
                &catalog,
                &roster,
            )
        })
    });

    c.bench_function("resolve_spec_focus", |b| {
        b.iter(|| {
            resolve(
                black_box(&Focus::Specialization("Mage 2".into())),
                &catalog,
                &roster,
            )
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let catalog = catalog();
    let roster = full_roster(&catalog);
    let json = serialize(&roster, chrono::Utc::now()).to_json();

    c.bench_function("serialize_full_roster", |b| {
        b.iter(|| serialize(black_box(&roster), chrono::Utc::now()).to_json())
    });

    c.bench_function("deserialize_full_roster", |b| {
        b.iter(|| deserialize_str(black_box(&json), &catalog))
    });
}

criterion_group!(benches, bench_aggregation, bench_highlight, bench_snapshot);
criterion_main!(benches);
