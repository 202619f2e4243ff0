//! Composition Snapshots
//!
//! Flat, name-only persistence of a roster:
//!
//! ```json
//! { "version": "1.0", "timestamp": "2026-01-01T12:00:00Z",
//!   "groups": { "1": { "1": "Arms Warrior", "2": null, ... }, ... } }
//! ```
//!
//! Only names are stored, so restoring against a changed catalog naturally
//! drops specializations that no longer exist. A blob whose shape is wrong is
//! rejected as a whole before anything is applied.

pub mod store;

use crate::catalog::Catalog;
use crate::constants::SNAPSHOT_VERSION;
use crate::error::SnapshotError;
use crate::roster::{Position, Roster};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub use store::{
    clear_saved, has_saved, load_composition, save_composition, saved_status, FileStore,
    MemoryStore, SavedStatus, SnapshotStore,
};

/// Serialized roster: group → slot → specialization name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    pub version: String,
    pub timestamp: String,
    pub groups: BTreeMap<u8, BTreeMap<u8, Option<String>>>,
}

impl CompositionSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Number of occupied slots recorded in the snapshot
    pub fn occupied_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .filter(|name| name.is_some())
            .count()
    }
}

/// Result of restoring a snapshot against a catalog
#[derive(Debug, Clone)]
pub struct RestoredRoster {
    pub roster: Roster,
    /// Positions whose stored name did not resolve; left empty
    pub unresolved: Vec<(Position, String)>,
    pub version: Option<String>,
    pub timestamp: Option<String>,
}

/// Serialize every roster position, empty ones as `null`
pub fn serialize(roster: &Roster, timestamp: DateTime<Utc>) -> CompositionSnapshot {
    let mut groups: BTreeMap<u8, BTreeMap<u8, Option<String>>> = BTreeMap::new();
    for pos in Position::all() {
        groups
            .entry(pos.group())
            .or_default()
            .insert(pos.slot(), roster.occupant_at(pos).map(|s| s.name.clone()));
    }
    CompositionSnapshot {
        version: SNAPSHOT_VERSION.to_string(),
        timestamp: timestamp.to_rfc3339(),
        groups,
    }
}

/// Restore a roster from JSON text
pub fn deserialize_str(json: &str, catalog: &Catalog) -> Result<RestoredRoster, SnapshotError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
    deserialize(&value, catalog)
}

/// Restore a roster from a parsed blob. Shape errors fail the whole restore;
/// unknown names only empty their own position.
pub fn deserialize(blob: &Value, catalog: &Catalog) -> Result<RestoredRoster, SnapshotError> {
    let entries = parse_entries(blob)?;

    let version = blob.get("version").and_then(Value::as_str).map(str::to_string);
    if let Some(v) = version.as_deref() {
        if v != SNAPSHOT_VERSION {
            warn!(version = v, expected = SNAPSHOT_VERSION, "restoring snapshot with unexpected version");
        }
    }

    let mut roster = Roster::new();
    let mut unresolved = Vec::new();
    for (pos, name) in entries {
        match catalog.get(&name) {
            Some(spec) => roster.place(pos, spec.clone()),
            None => {
                warn!(position = %pos, specialization = %name, "specialization not found in catalog, slot left empty");
                unresolved.push((pos, name));
            }
        }
    }

    debug!(
        placed = roster.occupied_count(),
        unresolved = unresolved.len(),
        "snapshot restored"
    );

    Ok(RestoredRoster {
        roster,
        unresolved,
        version,
        timestamp: blob
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Validate the blob's shape and collect (position, name) pairs for the
/// occupied slots. Nothing is resolved here.
fn parse_entries(blob: &Value) -> Result<Vec<(Position, String)>, SnapshotError> {
    let groups = blob
        .as_object()
        .ok_or_else(|| corrupt("snapshot is not an object"))?
        .get("groups")
        .ok_or_else(|| corrupt("missing groups"))?
        .as_object()
        .ok_or_else(|| corrupt("groups is not an object"))?;

    let mut entries = Vec::new();
    for (group_key, slots) in groups {
        let group: u32 = group_key
            .parse()
            .map_err(|_| corrupt(format!("group key '{group_key}' is not a number")))?;
        let slots = slots
            .as_object()
            .ok_or_else(|| corrupt(format!("group {group} is not an object")))?;

        for (slot_key, occupant) in slots {
            let slot: u32 = slot_key
                .parse()
                .map_err(|_| corrupt(format!("slot key '{slot_key}' is not a number")))?;
            let pos = Position::new(group, slot).map_err(|e| corrupt(e.to_string()))?;
            match occupant {
                Value::Null => {}
                Value::String(name) if name.is_empty() => {}
                Value::String(name) => entries.push((pos, name.clone())),
                other => {
                    return Err(corrupt(format!(
                        "slot {pos} holds {other} instead of a name"
                    )))
                }
            }
        }
    }
    Ok(entries)
}

fn corrupt(detail: impl Into<String>) -> SnapshotError {
    SnapshotError::Corrupt(detail.into())
}
