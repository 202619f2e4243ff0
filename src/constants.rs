//! Centralized constants for the raid composition core.
//!
//! Grid dimensions, record field limits, persistence keys and the loader's
//! fallback data live here so the catalog, roster, validator and loader agree.

// =====================================================
// Roster grid
// =====================================================

/// Number of groups in a raid
pub const GROUP_COUNT: u8 = 8;

/// Number of slots per group
pub const SLOTS_PER_GROUP: u8 = 5;

/// Total addressable roster positions (8 x 5)
pub const ROSTER_SIZE: usize = GROUP_COUNT as usize * SLOTS_PER_GROUP as usize;

// =====================================================
// Record limits
// =====================================================

/// Maximum length of a specialization or effect name
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a class name
pub const MAX_CLASS_LEN: usize = 50;

/// Maximum length of an icon path
pub const MAX_ICON_PATH_LEN: usize = 200;

/// Maximum length of an effect description
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum number of effects a single specialization may list
pub const MAX_EFFECTS: usize = 50;

// =====================================================
// Icons
// =====================================================

/// Substituted whenever an icon path cannot be served
pub const FALLBACK_ICON: &str = "raidicons/invalid.png";

// =====================================================
// Persistence
// =====================================================

/// Key under which the composition snapshot is stored
pub const SNAPSHOT_KEY: &str = "raidComposition";

/// Snapshot format version written by this crate
pub const SNAPSHOT_VERSION: &str = "1.0";

// =====================================================
// Catalog loading
// =====================================================

/// Global bound on the initial catalog load, in seconds
pub const LOAD_TIMEOUT_SECS: u64 = 10;

/// Schema file that sits next to specialization records but is not one
pub const SCHEMA_FILE: &str = "specialization_schema.json";

/// Manifest listing specialization files when directory listing is unavailable
pub const MANIFEST_FILE: &str = "manifest.json";

/// Last-resort file list used when neither listing nor manifest is available
pub const FALLBACK_SPEC_FILES: [&str; 28] = [
    "druid_balance.json",
    "druid_feral.json",
    "druid_guardian.json",
    "druid_restoration.json",
    "hunter_beastmastery.json",
    "hunter_marksman.json",
    "hunter_survival.json",
    "mage_arcane.json",
    "mage_fire.json",
    "mage_frost.json",
    "paladin_holy.json",
    "paladin_protection.json",
    "paladin_retribution.json",
    "priest_discipline.json",
    "priest_holy.json",
    "priest_shadow.json",
    "rogue_assassination.json",
    "rogue_combat.json",
    "rogue_subtlety.json",
    "shaman_elemental.json",
    "shaman_enhancement.json",
    "shaman_restoration.json",
    "warlock_affliction.json",
    "warlock_demonology.json",
    "warlock_destruction.json",
    "warrior_arms.json",
    "warrior_fury.json",
    "warrior_protection.json",
];
