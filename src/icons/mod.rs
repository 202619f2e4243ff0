//! Icon Resolution
//!
//! Icon paths come from the catalog but the files behind them may be
//! missing. A probe checks existence and a missing icon is swapped for the
//! fallback. Probes run asynchronously, so results for roster positions are
//! keyed by the position's generation: a result that arrives after the
//! occupant changed is dropped.

use crate::constants::FALLBACK_ICON;
use crate::roster::{Position, Roster};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Checks whether an icon path can be served
#[async_trait]
pub trait IconProbe: Send + Sync {
    async fn exists(&self, path: &str) -> bool;
}

/// Probe by issuing `HEAD {base_url}/{path}`
#[derive(Debug, Clone)]
pub struct HttpIconProbe {
    client: Client,
    base_url: String,
}

impl HttpIconProbe {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IconProbe for HttpIconProbe {
    async fn exists(&self, path: &str) -> bool {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        match self.client.head(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "icon probe failed");
                false
            }
        }
    }
}

/// Probe by checking for a file under a static root directory
#[derive(Debug, Clone)]
pub struct FsIconProbe {
    root: PathBuf,
}

impl FsIconProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl IconProbe for FsIconProbe {
    async fn exists(&self, path: &str) -> bool {
        let full = self.root.join(path.trim_start_matches('/'));
        tokio::fs::metadata(&full)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

/// The path itself when the probe finds it, otherwise `fallback`
pub async fn resolve_icon(probe: &dyn IconProbe, path: &str, fallback: &str) -> String {
    if !path.is_empty() && probe.exists(path).await {
        return path.to_string();
    }
    warn!(icon = path, fallback, "icon not found, using fallback");
    fallback.to_string()
}

/// [`resolve_icon`] with the default fallback icon
pub async fn resolve_icon_or_default(probe: &dyn IconProbe, path: &str) -> String {
    resolve_icon(probe, path, FALLBACK_ICON).await
}

/// A pending icon lookup for one roster position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTicket {
    pub position: Position,
    pub generation: u64,
    pub path: String,
}

/// Resolved icons per roster position, tagged with the generation they
/// were resolved for.
#[derive(Debug, Clone, Default)]
pub struct IconTracker {
    resolved: HashMap<Position, (u64, String)>,
}

impl IconTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for the current occupant of `pos`; `None` for an empty slot
    pub fn issue(&self, roster: &Roster, pos: Position) -> Option<IconTicket> {
        roster.occupant_at(pos).map(|spec| IconTicket {
            position: pos,
            generation: roster.generation(pos),
            path: spec.icon_path.clone(),
        })
    }

    /// Tickets for every occupied position
    pub fn issue_all(&self, roster: &Roster) -> Vec<IconTicket> {
        roster
            .occupied()
            .filter_map(|(pos, _)| self.issue(roster, pos))
            .collect()
    }

    /// Record a probe result. Returns false, recording nothing, when the
    /// position changed since the ticket was issued.
    pub fn complete(&mut self, roster: &Roster, ticket: &IconTicket, icon: String) -> bool {
        let current = roster.generation(ticket.position);
        if current != ticket.generation {
            debug!(
                position = %ticket.position,
                ticket_generation = ticket.generation,
                current_generation = current,
                "discarding stale icon result"
            );
            return false;
        }
        self.resolved
            .insert(ticket.position, (ticket.generation, icon));
        true
    }

    /// Resolved icon for `pos`, only if it belongs to the current occupant
    pub fn icon_for(&self, roster: &Roster, pos: Position) -> Option<&str> {
        self.resolved
            .get(&pos)
            .filter(|(generation, _)| *generation == roster.generation(pos))
            .map(|(_, icon)| icon.as_str())
    }

    /// Forget results whose position has moved on
    pub fn prune(&mut self, roster: &Roster) {
        self.resolved
            .retain(|pos, (generation, _)| *generation == roster.generation(*pos));
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Probe every issued ticket concurrently and return the resolved paths.
/// Apply the results with [`IconTracker::complete`].
pub async fn probe_tickets(
    probe: Arc<dyn IconProbe>,
    tickets: Vec<IconTicket>,
    fallback: &str,
) -> Vec<(IconTicket, String)> {
    let mut set = JoinSet::new();
    for ticket in tickets {
        let probe = Arc::clone(&probe);
        let fallback = fallback.to_string();
        set.spawn(async move {
            let icon = resolve_icon(probe.as_ref(), &ticket.path, &fallback).await;
            (ticket, icon)
        });
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => warn!(error = %e, "icon probe task failed"),
        }
    }
    results
}
