//! Catalog Hot-reload
//!
//! Watches the specialization directory and reports when a record file is
//! created, modified or removed:
//! - Uses `notify` crate for filesystem events
//! - Events surface through an mpsc receiver, polled by the owner
//! - Non-record files (schema, manifest, editor temp files) are ignored
//!
//! The watcher only reports. Reloading and reconciling the roster is the
//! session's job, so a failed reload leaves the previous catalog in place.

use crate::loader::is_spec_file;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Quiet period used to coalesce bursts of events from a single save
const DEBOUNCE: Duration = Duration::from_millis(200);

/// File watcher for a specialization directory
pub struct CatalogWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    dir: PathBuf,
}

impl CatalogWatcher {
    pub fn watch(dir: impl Into<PathBuf>) -> notify::Result<Self> {
        let dir = dir.into();
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), "watching specialization directory");
        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Changed record files among the pending events, without blocking
    pub fn drain_changes(&self) -> BTreeSet<PathBuf> {
        let mut changed = BTreeSet::new();
        while let Ok(result) = self.receiver.try_recv() {
            collect_changes(result, &mut changed);
        }
        changed
    }

    /// Block until a record file changes or `timeout` elapses. Events
    /// arriving shortly after the first are folded into the same batch.
    /// `None` on timeout or when the watcher has shut down.
    pub fn wait_for_changes(&self, timeout: Duration) -> Option<BTreeSet<PathBuf>> {
        let mut changed = BTreeSet::new();
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => collect_changes(result, &mut changed),
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("catalog watcher disconnected");
                return None;
            }
        }
        while let Ok(result) = self.receiver.recv_timeout(DEBOUNCE) {
            collect_changes(result, &mut changed);
        }
        Some(changed)
    }
}

fn collect_changes(result: notify::Result<Event>, changed: &mut BTreeSet<PathBuf>) {
    match result {
        Ok(event) if is_spec_change_event(&event) => {
            debug!(kind = ?event.kind, paths = ?event.paths, "specialization file changed");
            changed.extend(event.paths);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "file watcher error"),
    }
}

/// Create, modify or remove of a specialization record file
pub fn is_spec_change_event(event: &Event) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind
        && event.paths.iter().any(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_spec_file)
        })
}

/// Reload bookkeeping for the watch loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadStatus {
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_error: Option<String>,
    pub specializations: usize,
    pub dropped_occupants: usize,
}

impl ReloadStatus {
    pub fn record_success(&mut self, specializations: usize, dropped_occupants: usize) {
        self.reload_count += 1;
        self.last_reload_success = true;
        self.last_error = None;
        self.specializations = specializations;
        self.dropped_occupants = dropped_occupants;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_reload_success = false;
        self.last_error = Some(error.into());
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
