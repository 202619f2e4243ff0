//! Raid Composition Core Library
//!
//! The planning model behind a raid composition tool:
//! - Specialization catalog (validated, immutable per load)
//! - Roster grid (8 groups × 5 slots)
//! - Effect aggregation (per-group and raid-wide summaries)
//! - Highlight resolution (which cards and indicators relate to a focus)
//! - Composition snapshots (name-only persistence)
//! - Catalog loading from a directory or HTTP server, icon probing
//! - Planner session tying the above together

pub mod catalog;
pub mod config;
pub mod constants;
pub mod effects;
pub mod error;
pub mod highlight;
pub mod hotreload;
pub mod icons;
pub mod loader;
pub mod logging;
pub mod roster;
pub mod session;
pub mod snapshot;
pub mod specialization;
pub mod validation;

pub use catalog::Catalog;
pub use effects::{summarize, CompositionSummary};
pub use highlight::{Focus, HighlightSet, Highlighter};
pub use roster::{Assignment, Position, Roster};
pub use session::PlannerSession;
pub use specialization::{Effect, EffectScope, EffectType, Specialization};
