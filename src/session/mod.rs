//! Planner Session
//!
//! Owns the catalog, the roster, the active highlight and the icon results
//! for one planning session, and keeps them consistent: every roster change
//! refreshes the highlight, a catalog reload prunes the roster, and a dirty
//! flag tracks changes not yet saved.

use crate::catalog::Catalog;
use crate::effects::{summarize, CompositionSummary};
use crate::error::{RosterError, SnapshotError};
use crate::highlight::{Focus, HighlightSet, Highlighter};
use crate::icons::{probe_tickets, IconProbe, IconTracker};
use crate::roster::{Assignment, Position, Roster};
use crate::snapshot::{
    clear_saved, has_saved, load_composition, save_composition, saved_status,
    CompositionSnapshot, SnapshotStore,
};
use crate::specialization::Specialization;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PlannerSession {
    catalog: Catalog,
    roster: Roster,
    highlighter: Highlighter,
    icons: IconTracker,
    dirty: bool,
}

impl PlannerSession {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            roster: Roster::new(),
            highlighter: Highlighter::new(),
            icons: IconTracker::new(),
            dirty: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn icons(&self) -> &IconTracker {
        &self.icons
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =====================================================
    // Roster edits
    // =====================================================

    pub fn assign(&mut self, group: u32, slot: u32, name: &str) -> Result<Assignment, RosterError> {
        let pos = Position::new(group, slot)?;
        let outcome = self.roster.assign(pos, name, &self.catalog);
        if outcome == Assignment::Assigned {
            self.roster_changed();
        }
        Ok(outcome)
    }

    /// Move an occupant; the target's previous occupant is replaced.
    /// Returns false when the source was empty or equals the target.
    pub fn move_occupant(
        &mut self,
        from: (u32, u32),
        to: (u32, u32),
    ) -> Result<bool, RosterError> {
        let from = Position::new(from.0, from.1)?;
        let to = Position::new(to.0, to.1)?;
        let moved = self.roster.move_occupant(from, to);
        if moved {
            self.roster_changed();
        }
        Ok(moved)
    }

    pub fn clear(
        &mut self,
        group: u32,
        slot: u32,
    ) -> Result<Option<Arc<Specialization>>, RosterError> {
        let pos = Position::new(group, slot)?;
        let previous = self.roster.clear(pos);
        if previous.is_some() {
            self.roster_changed();
        }
        Ok(previous)
    }

    /// Empty every slot. The session counts as clean afterwards.
    pub fn clear_all(&mut self) {
        self.roster.clear_all();
        self.roster_changed();
        self.dirty = false;
    }

    fn roster_changed(&mut self) {
        self.dirty = true;
        self.highlighter.refresh(&self.catalog, &self.roster);
        self.icons.prune(&self.roster);
    }

    // =====================================================
    // Views
    // =====================================================

    pub fn summary(&self) -> CompositionSummary {
        summarize(&self.catalog, &self.roster)
    }

    pub fn focus(&mut self, focus: Focus) -> &HighlightSet {
        self.highlighter.focus(focus, &self.catalog, &self.roster)
    }

    pub fn clear_focus(&mut self) {
        self.highlighter.clear();
    }

    /// Probe icons for every occupied position and record the results that
    /// are still current.
    pub async fn refresh_icons(&mut self, probe: Arc<dyn IconProbe>, fallback: &str) -> usize {
        let tickets = self.icons.issue_all(&self.roster);
        let results = probe_tickets(probe, tickets, fallback).await;
        let mut applied = 0;
        for (ticket, icon) in results {
            if self.icons.complete(&self.roster, &ticket, icon) {
                applied += 1;
            }
        }
        debug!(applied, "icons refreshed");
        applied
    }

    // =====================================================
    // Catalog reload
    // =====================================================

    /// Swap in a freshly loaded catalog. Occupants that no longer resolve
    /// are removed and returned.
    pub fn replace_catalog(&mut self, catalog: Catalog) -> Vec<(Position, String)> {
        self.catalog = catalog;
        let dropped = self.roster.retain_resolvable(&self.catalog);
        for (pos, name) in &dropped {
            warn!(position = %pos, specialization = %name, "specialization removed from catalog, slot cleared");
        }
        if !dropped.is_empty() {
            self.dirty = true;
        }
        self.highlighter.refresh(&self.catalog, &self.roster);
        self.icons.prune(&self.roster);
        info!(
            specializations = self.catalog.len(),
            dropped = dropped.len(),
            "catalog replaced"
        );
        dropped
    }

    // =====================================================
    // Persistence
    // =====================================================

    pub fn save(
        &mut self,
        store: &mut dyn SnapshotStore,
    ) -> Result<CompositionSnapshot, SnapshotError> {
        let snapshot = save_composition(store, &self.roster)?;
        self.dirty = false;
        Ok(snapshot)
    }

    /// Replace the roster with the stored composition. Returns the stored
    /// names that did not resolve, or `None` when nothing is saved. On error
    /// the roster is untouched.
    pub fn restore(
        &mut self,
        store: &mut dyn SnapshotStore,
    ) -> Result<Option<Vec<(Position, String)>>, SnapshotError> {
        let Some(restored) = load_composition(store, &self.catalog)? else {
            return Ok(None);
        };

        // Placed one by one so position generations keep advancing
        self.roster.clear_all();
        for (pos, spec) in restored.roster.occupied() {
            self.roster.place(pos, Arc::clone(spec));
        }
        self.highlighter.refresh(&self.catalog, &self.roster);
        self.icons.prune(&self.roster);
        self.dirty = false;
        Ok(Some(restored.unresolved))
    }

    pub fn forget_saved(&mut self, store: &mut dyn SnapshotStore) -> Result<(), SnapshotError> {
        clear_saved(store)
    }

    /// Header line describing the saved composition and unsaved changes
    pub fn status_line(&self, store: &dyn SnapshotStore) -> String {
        let dirty = if self.dirty { " (unsaved changes)" } else { "" };
        if !has_saved(store) {
            return format!("No composition saved{dirty}");
        }
        let Some(status) = saved_status(store) else {
            return format!("Saved composition available (timestamp unavailable){dirty}");
        };
        let when = DateTime::parse_from_rfc3339(&status.timestamp)
            .map(|ts| {
                ts.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or(status.timestamp);
        format!("Saved: {when} ({} specs){dirty}", status.spec_count)
    }
}
