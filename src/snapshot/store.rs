//! Snapshot Storage
//!
//! A small key-value seam for persisting composition snapshots, plus the
//! save / load / clear operations built on it. A stored blob that fails to
//! restore is removed so the next start does not trip over it again.

use super::{deserialize_str, serialize, CompositionSnapshot, RestoredRoster};
use crate::catalog::Catalog;
use crate::constants::SNAPSHOT_KEY;
use crate::error::SnapshotError;
use crate::roster::Roster;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// String key-value storage for snapshot blobs
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), SnapshotError>;
    fn remove(&mut self, key: &str) -> Result<(), SnapshotError>;
}

/// In-process store; contents vanish with the value
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), SnapshotError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SnapshotError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file: `{ key: blob, ... }`.
/// A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SnapshotError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(SnapshotError::Store(format!("{}: {e}", self.path.display()))),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(SnapshotError::Store(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_map(&self, map: Map<String, Value>) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| SnapshotError::Store(format!("{}: {e}", parent.display())))?;
            }
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, text)
            .map_err(|e| SnapshotError::Store(format!("{}: {e}", self.path.display())))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self
            .read_map()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), SnapshotError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value));
        self.write_map(map)
    }

    fn remove(&mut self, key: &str) -> Result<(), SnapshotError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(map)?;
        }
        Ok(())
    }
}

/// Timestamp and occupancy of the stored snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedStatus {
    pub timestamp: String,
    pub spec_count: usize,
}

/// Serialize the roster and store it under the composition key
pub fn save_composition(
    store: &mut dyn SnapshotStore,
    roster: &Roster,
) -> Result<CompositionSnapshot, SnapshotError> {
    let snapshot = serialize(roster, Utc::now());
    store.set(SNAPSHOT_KEY, serde_json::to_string(&snapshot)?)?;
    info!(
        specializations = snapshot.occupied_count(),
        timestamp = %snapshot.timestamp,
        "composition saved"
    );
    Ok(snapshot)
}

/// Restore the stored composition. `Ok(None)` when nothing is stored; a
/// corrupt blob is removed from the store before the error is returned.
pub fn load_composition(
    store: &mut dyn SnapshotStore,
    catalog: &Catalog,
) -> Result<Option<RestoredRoster>, SnapshotError> {
    let Some(blob) = store.get(SNAPSHOT_KEY)? else {
        debug!("no saved composition");
        return Ok(None);
    };

    match deserialize_str(&blob, catalog) {
        Ok(restored) => {
            info!(
                specializations = restored.roster.occupied_count(),
                unresolved = restored.unresolved.len(),
                "composition loaded"
            );
            Ok(Some(restored))
        }
        Err(e) => {
            error!(error = %e, "saved composition is unreadable, discarding it");
            if let Err(remove_err) = store.remove(SNAPSHOT_KEY) {
                warn!(error = %remove_err, "failed to discard corrupt composition");
            }
            Err(e)
        }
    }
}

pub fn clear_saved(store: &mut dyn SnapshotStore) -> Result<(), SnapshotError> {
    store.remove(SNAPSHOT_KEY)?;
    info!("saved composition cleared");
    Ok(())
}

/// True when a stored blob parses and carries a `groups` object
pub fn has_saved(store: &dyn SnapshotStore) -> bool {
    parse_stored(store)
        .map(|value| value.get("groups").is_some_and(Value::is_object))
        .unwrap_or(false)
}

/// Timestamp and spec count of the stored snapshot, if one is readable
pub fn saved_status(store: &dyn SnapshotStore) -> Option<SavedStatus> {
    let value = parse_stored(store)?;
    let timestamp = value.get("timestamp")?.as_str()?.to_string();
    let spec_count = value
        .get("groups")?
        .as_object()?
        .values()
        .filter_map(Value::as_object)
        .flat_map(|slots| slots.values())
        .filter(|occupant| occupant.as_str().is_some_and(|name| !name.is_empty()))
        .count();
    Some(SavedStatus {
        timestamp,
        spec_count,
    })
}

fn parse_stored(store: &dyn SnapshotStore) -> Option<Value> {
    let blob = store.get(SNAPSHOT_KEY).ok()??;
    serde_json::from_str(&blob).ok()
}
