//! Roster Grid
//!
//! The assignment state: 8 groups × 5 slots, each position empty or holding
//! a shared immutable snapshot of a catalog specialization. The same
//! specialization may occupy any number of positions.
//!
//! Every position carries a generation counter that is bumped whenever its
//! occupant changes, so asynchronous work keyed to a position (icon probes)
//! can tell whether its result is still current.

use crate::catalog::Catalog;
use crate::constants::{GROUP_COUNT, ROSTER_SIZE, SLOTS_PER_GROUP};
use crate::error::RosterError;
use crate::specialization::Specialization;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Group number, 1-based
pub type GroupId = u8;

/// A validated (group, slot) address, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    group: GroupId,
    slot: u8,
}

/// Unchecked wire form; deserialization goes through `Position::new`
#[derive(Deserialize)]
struct RawPosition {
    group: u32,
    slot: u32,
}

impl TryFrom<RawPosition> for Position {
    type Error = RosterError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.group, raw.slot)
    }
}

impl Position {
    pub fn new(group: u32, slot: u32) -> Result<Self, RosterError> {
        let valid_group = (1..=GROUP_COUNT as u32).contains(&group);
        let valid_slot = (1..=SLOTS_PER_GROUP as u32).contains(&slot);
        if !valid_group || !valid_slot {
            return Err(RosterError::InvalidPosition { group, slot });
        }
        Ok(Self {
            group: group as GroupId,
            slot: slot as u8,
        })
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Every position in group-then-slot order
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=GROUP_COUNT).flat_map(|group| {
            (1..=SLOTS_PER_GROUP).map(move |slot| Position { group, slot })
        })
    }

    /// Positions of one group; empty for an out-of-range group
    pub fn in_group(group: GroupId) -> impl Iterator<Item = Position> {
        let slots = if (1..=GROUP_COUNT).contains(&group) {
            1..=SLOTS_PER_GROUP
        } else {
            1..=0
        };
        slots.map(move |slot| Position { group, slot })
    }

    fn index(&self) -> usize {
        (self.group as usize - 1) * SLOTS_PER_GROUP as usize + (self.slot as usize - 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.slot)
    }
}

/// Outcome of an assignment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Assigned,
    /// The name did not resolve in the catalog; nothing changed
    Unresolved(String),
}

#[derive(Debug, Clone)]
pub struct Roster {
    slots: [Option<Arc<Specialization>>; ROSTER_SIZE],
    generations: [u64; ROSTER_SIZE],
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            generations: [0; ROSTER_SIZE],
        }
    }
}

/// Rosters are equal when every position holds an equal occupant;
/// generation counters are bookkeeping and not compared.
impl PartialEq for Roster {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Eq for Roster {}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` in the catalog and place it at `pos`
    pub fn assign(&mut self, pos: Position, name: &str, catalog: &Catalog) -> Assignment {
        match catalog.get(name) {
            Some(spec) => {
                self.place(pos, Arc::clone(spec));
                Assignment::Assigned
            }
            None => {
                debug!(position = %pos, specialization = name, "unresolved specialization, assign ignored");
                Assignment::Unresolved(name.to_string())
            }
        }
    }

    /// Place an already-resolved specialization, replacing any occupant
    pub fn place(&mut self, pos: Position, spec: Arc<Specialization>) {
        let idx = pos.index();
        self.slots[idx] = Some(spec);
        self.generations[idx] += 1;
    }

    /// Move the occupant of `from` to `to`, replacing whatever `to` held.
    /// Returns false (and changes nothing) when `from` is empty or equals `to`.
    pub fn move_occupant(&mut self, from: Position, to: Position) -> bool {
        if from == to {
            return false;
        }
        let Some(spec) = self.slots[from.index()].take() else {
            return false;
        };
        self.generations[from.index()] += 1;
        self.place(to, spec);
        true
    }

    /// Empty a position; returns the previous occupant
    pub fn clear(&mut self, pos: Position) -> Option<Arc<Specialization>> {
        let idx = pos.index();
        let previous = self.slots[idx].take();
        if previous.is_some() {
            self.generations[idx] += 1;
        }
        previous
    }

    pub fn clear_all(&mut self) {
        for pos in Position::all() {
            self.clear(pos);
        }
    }

    pub fn occupant_at(&self, pos: Position) -> Option<&Arc<Specialization>> {
        self.slots[pos.index()].as_ref()
    }

    pub fn generation(&self, pos: Position) -> u64 {
        self.generations[pos.index()]
    }

    /// Occupied positions in group-then-slot order
    pub fn occupied(&self) -> impl Iterator<Item = (Position, &Arc<Specialization>)> {
        Position::all().filter_map(move |pos| self.occupant_at(pos).map(|spec| (pos, spec)))
    }

    /// Occupied positions of a single group
    pub fn group(&self, group: GroupId) -> impl Iterator<Item = (Position, &Arc<Specialization>)> {
        Position::in_group(group)
            .filter_map(move |pos| self.occupant_at(pos).map(|spec| (pos, spec)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    /// Reconcile the roster with a (re)loaded catalog: occupants whose name no
    /// longer resolves are removed. Survivors keep the record they were
    /// assigned with. Returns the removed positions with their names.
    pub fn retain_resolvable(&mut self, catalog: &Catalog) -> Vec<(Position, String)> {
        let mut dropped = Vec::new();
        for pos in Position::all() {
            let Some(current) = self.slots[pos.index()].as_ref() else {
                continue;
            };
            if catalog.contains(&current.name) {
                continue;
            }
            let name = current.name.clone();
            self.clear(pos);
            dropped.push((pos, name));
        }
        dropped
    }
}
