use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use raid_core::config::PlannerConfig;
use raid_core::effects::{EffectBreakdown, EffectStatus};
use raid_core::highlight::HighlightTarget;
use raid_core::hotreload::{CatalogWatcher, ReloadStatus};
use raid_core::icons::{FsIconProbe, HttpIconProbe, IconProbe};
use raid_core::loader::{load_catalog, DirectorySource, HttpSource, SpecSource};
use raid_core::logging::{init_tracing, LogLevel, TimingSpan};
use raid_core::snapshot::FileStore;
use raid_core::{Assignment, Catalog, EffectType, Focus, PlannerSession, Position};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "raid-planner")]
#[command(about = "Plan raid compositions and inspect the buffs they provide", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Planner config file (JSON)
    #[arg(short, long, global = true, default_value = "raid_planner.json")]
    config: PathBuf,

    /// Specialization directory, overrides the config
    #[arg(long, global = true, env = "RAID_SPECS_DIR")]
    specs: Option<PathBuf>,

    /// Load specializations from this server instead of a directory
    #[arg(long, global = true, env = "RAID_SERVER_URL")]
    server: Option<String>,

    /// Composition store file, overrides the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog by class
    Catalog,

    /// Show the saved composition with group and raid effects
    Show {
        /// Probe roster icons and report missing ones
        #[arg(long)]
        check_icons: bool,
    },

    /// Place a specialization in a slot
    Assign {
        group: u32,
        slot: u32,
        /// Specialization name, e.g. "Arms Warrior"
        name: String,
    },

    /// Move an occupant to another slot, replacing what is there
    Move {
        from_group: u32,
        from_slot: u32,
        to_group: u32,
        to_slot: u32,
    },

    /// Empty a slot
    Clear { group: u32, slot: u32 },

    /// Empty every slot
    ClearAll,

    /// Delete the saved composition
    Forget,

    /// Show what a focus highlights
    Highlight {
        /// Effects of this specialization
        #[arg(long, conflicts_with_all = ["raid_effect", "group_effect"])]
        spec: Option<String>,

        /// Providers of this raid effect
        #[arg(long, conflicts_with = "group_effect")]
        raid_effect: Option<String>,

        /// Providers of this group effect within --group
        #[arg(long, requires = "group")]
        group_effect: Option<String>,

        #[arg(long)]
        group: Option<u8>,
    },

    /// Reload the catalog whenever specialization files change
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PlannerConfig::load_or_default(&cli.config)
        .with_context(|| format!("reading config {}", cli.config.display()))?;
    if let Some(dir) = cli.specs.clone() {
        config.specializations_dir = dir;
    }
    if let Some(url) = cli.server.clone() {
        config.server_url = Some(url);
    }
    if let Some(store) = cli.store.clone() {
        config.snapshot_path = store;
    }

    let mut tracing_config = config.tracing.clone();
    if cli.verbose {
        tracing_config = tracing_config.with_default_level(LogLevel::Debug);
    }
    init_tracing(&tracing_config);

    let catalog = load(&config).await?;
    let mut store = FileStore::new(&config.snapshot_path);
    let mut session = PlannerSession::new(catalog);
    if let Err(e) = session.restore(&mut store) {
        warn!(error = %e, "saved composition discarded");
    }

    match cli.command {
        Commands::Catalog => print_catalog(session.catalog()),
        Commands::Show { check_icons } => {
            print_composition(&session);
            if check_icons {
                check_roster_icons(&mut session, &config).await?;
            }
            println!("\n{}", session.status_line(&store));
        }
        Commands::Assign { group, slot, name } => {
            match session.assign(group, slot, &name)? {
                Assignment::Assigned => println!("{name} -> {group}/{slot}"),
                Assignment::Unresolved(name) => bail!("unknown specialization '{name}'"),
            }
            session.save(&mut store)?;
        }
        Commands::Move {
            from_group,
            from_slot,
            to_group,
            to_slot,
        } => {
            if !session.move_occupant((from_group, from_slot), (to_group, to_slot))? {
                bail!("nothing to move from {from_group}/{from_slot}");
            }
            println!("{from_group}/{from_slot} -> {to_group}/{to_slot}");
            session.save(&mut store)?;
        }
        Commands::Clear { group, slot } => {
            match session.clear(group, slot)? {
                Some(spec) => println!("removed {} from {group}/{slot}", spec.name),
                None => println!("{group}/{slot} was already empty"),
            }
            session.save(&mut store)?;
        }
        Commands::ClearAll => {
            session.clear_all();
            session.save(&mut store)?;
            println!("all slots cleared");
        }
        Commands::Forget => {
            session.forget_saved(&mut store)?;
            println!("saved composition deleted");
        }
        Commands::Highlight {
            spec,
            raid_effect,
            group_effect,
            group,
        } => {
            let focus = match (spec, raid_effect, group_effect, group) {
                (Some(name), _, _, _) => Focus::Specialization(name),
                (_, Some(name), _, _) => Focus::RaidEffect(name),
                (_, _, Some(name), Some(group)) => Focus::GroupEffect { name, group },
                _ => bail!("pass --spec, --raid-effect, or --group-effect with --group"),
            };
            print_highlight(&mut session, focus);
        }
        Commands::Watch => watch(session, &config).await?,
    }

    Ok(())
}

fn spec_source(config: &PlannerConfig) -> anyhow::Result<Arc<dyn SpecSource>> {
    Ok(match &config.server_url {
        Some(url) => Arc::new(
            HttpSource::new(url.clone(), config.load_timeout()).context("building HTTP client")?,
        ),
        None => Arc::new(DirectorySource::new(&config.specializations_dir)),
    })
}

async fn load(config: &PlannerConfig) -> anyhow::Result<Catalog> {
    let _span = TimingSpan::new("load_catalog");
    let (catalog, report) = load_catalog(spec_source(config)?, config.load_timeout())
        .await
        .context("loading specializations")?;
    for (file, reason) in &report.failed {
        warn!(file = %file, reason = %reason, "specialization skipped");
    }
    Ok(catalog)
}

fn print_catalog(catalog: &Catalog) {
    for class in catalog.classes() {
        println!("{class}");
        for spec in catalog.by_class(class) {
            println!("  {:<28} {}", spec.name, EffectBreakdown::of(spec).label());
        }
    }
    println!("\n{} specializations", catalog.len());
}

fn print_composition(session: &PlannerSession) {
    let summary = session.summary();
    let roster = session.roster();

    for (group, effects) in &summary.groups {
        println!("Group {group}");
        for pos in Position::in_group(*group) {
            let occupant = roster
                .occupant_at(pos)
                .map(|s| s.name.as_str())
                .unwrap_or("-");
            println!("  {}: {occupant}", pos.slot());
        }
        for entry in &effects.entries {
            println!(
                "  * [{}] {}: {}",
                entry.effect_type.display_name(),
                entry.name,
                entry.display_description()
            );
        }
    }

    println!(
        "\nActive Effects: {} / {}",
        summary.stats.active, summary.stats.total
    );
    for effect_type in EffectType::all() {
        let effects = summary.raid.get(effect_type);
        if effects.is_empty() {
            continue;
        }
        println!("{}", effect_type.display_name());
        for effect in effects {
            let marker = match effect.status() {
                EffectStatus::Active => format!("x{}", effect.count),
                EffectStatus::Available => "--".to_string(),
            };
            println!(
                "  {marker:>4} {} ({})",
                effect.name,
                effect.display_sources().join(", ")
            );
        }
    }
}

fn print_highlight(session: &mut PlannerSession, focus: Focus) {
    let set = session.focus(focus);
    println!("{} ({})", set.kind.as_str(), set.kind.css_class());
    if set.is_empty() {
        println!("  nothing highlighted");
    }
    for target in &set.targets {
        match target {
            HighlightTarget::CatalogEntry(name) => println!("  catalog: {name}"),
            HighlightTarget::RosterPosition(pos) => println!("  slot:    {pos}"),
            HighlightTarget::GroupEffectIndicator { group, name } => {
                println!("  group {group} effect: {name}")
            }
            HighlightTarget::RaidEffectIndicator(name) => println!("  raid effect: {name}"),
        }
    }
}

async fn check_roster_icons(
    session: &mut PlannerSession,
    config: &PlannerConfig,
) -> anyhow::Result<()> {
    let probe: Arc<dyn IconProbe> = match &config.server_url {
        Some(url) => Arc::new(
            HttpIconProbe::new(url.clone(), config.load_timeout())
                .context("building HTTP client")?,
        ),
        None => Arc::new(FsIconProbe::new(&config.static_root)),
    };
    session.refresh_icons(probe, &config.fallback_icon).await;

    let missing: Vec<_> = session
        .roster()
        .occupied()
        .filter(|(pos, _)| {
            session.icons().icon_for(session.roster(), *pos) == Some(config.fallback_icon.as_str())
        })
        .map(|(pos, spec)| format!("{pos} {} ({})", spec.name, spec.icon_path))
        .collect();
    if missing.is_empty() {
        println!("\nall roster icons found");
    } else {
        println!("\nmissing icons:");
        for line in missing {
            println!("  {line}");
        }
    }
    Ok(())
}

async fn watch(mut session: PlannerSession, config: &PlannerConfig) -> anyhow::Result<()> {
    if config.server_url.is_some() {
        bail!("watch needs a local specialization directory");
    }
    let watcher = CatalogWatcher::watch(&config.specializations_dir)
        .with_context(|| format!("watching {}", config.specializations_dir.display()))?;
    let mut status = ReloadStatus::default();
    println!(
        "watching {} ({} specializations), Ctrl-C to stop",
        watcher.dir().display(),
        session.catalog().len()
    );

    loop {
        // Changes that landed while the previous reload ran go first
        let pending = watcher.drain_changes();
        let changed = if pending.is_empty() {
            let waited =
                tokio::task::block_in_place(|| watcher.wait_for_changes(Duration::from_secs(1)));
            let Some(changed) = waited else {
                continue;
            };
            changed
        } else {
            pending
        };
        if changed.is_empty() {
            continue;
        }
        info!(files = changed.len(), "specialization files changed, reloading");

        match load(config).await {
            Ok(catalog) => {
                let dropped = session.replace_catalog(catalog);
                status.record_success(session.catalog().len(), dropped.len());
                println!(
                    "reloaded: {} specializations, {} slots cleared",
                    status.specializations, status.dropped_occupants
                );
            }
            Err(e) => {
                status.record_failure(format!("{e:#}"));
                warn!(error = %format!("{e:#}"), "reload failed, keeping previous catalog");
            }
        }
    }
}
