//! Catalog Loader
//!
//! Discovers specialization files, fetches them concurrently, validates each
//! record and builds a [`Catalog`] from the survivors.
//!
//! Discovery falls through three layers: a directory listing, then a
//! `manifest.json` (`{ "files": [...] }`), then a fixed list of the stock
//! specialization files. One bad file never fails the load; only a load that
//! yields no valid record at all is an error.
//!
//! The whole fetch phase is bounded by a single deadline. Records that
//! arrived before it are kept and the stragglers are reported as failed.

mod sources;

pub use sources::{DirectorySource, HttpSource};

use crate::catalog::Catalog;
use crate::constants::{FALLBACK_SPEC_FILES, MANIFEST_FILE, SCHEMA_FILE};
use crate::error::{CatalogError, LoadError};
use crate::specialization::Specialization;
use crate::validation::validate_specialization;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where specialization records come from
#[async_trait]
pub trait SpecSource: Send + Sync {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// File names from a directory listing
    async fn list_files(&self) -> Result<Vec<String>, LoadError>;

    /// File names from the manifest
    async fn manifest_files(&self) -> Result<Vec<String>, LoadError>;

    /// One raw record
    async fn fetch(&self, file: &str) -> Result<Value, LoadError>;
}

/// Which discovery layer produced the file list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    Listing,
    Manifest,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub discovery: Discovery,
    pub loaded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub timed_out: bool,
}

impl LoadReport {
    pub fn attempted(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }
}

/// True for names that look like specialization records
pub fn is_spec_file(name: &str) -> bool {
    name.ends_with(".json") && name != SCHEMA_FILE && name != MANIFEST_FILE
}

/// Run the discovery layers in order and return the first non-empty list
pub async fn discover_files(source: &dyn SpecSource) -> (Vec<String>, Discovery) {
    match source.list_files().await {
        Ok(files) if !files.is_empty() => {
            debug!(count = files.len(), "discovered specialization files from listing");
            return (files, Discovery::Listing);
        }
        Ok(_) => debug!("directory listing is empty, trying manifest"),
        Err(e) => debug!(error = %e, "directory listing unavailable, trying manifest"),
    }

    match source.manifest_files().await {
        Ok(files) if !files.is_empty() => {
            debug!(count = files.len(), "discovered specialization files from manifest");
            return (files, Discovery::Manifest);
        }
        Ok(_) => debug!("manifest lists no files, using fallback list"),
        Err(e) => debug!(error = %e, "manifest unavailable, using fallback list"),
    }

    warn!(
        source = %source.describe(),
        "could not discover specialization files, using fallback list"
    );
    let files = FALLBACK_SPEC_FILES.iter().map(|f| f.to_string()).collect();
    (files, Discovery::Fallback)
}

/// Fetch and validate a single file
pub async fn load_file(source: &dyn SpecSource, file: &str) -> Result<Specialization, LoadError> {
    let value = source.fetch(file).await?;
    validate_specialization(&value).map_err(|source| LoadError::Invalid {
        file: file.to_string(),
        source,
    })
}

/// Discover, fetch and validate every specialization file within `timeout`
pub async fn load_catalog(
    source: Arc<dyn SpecSource>,
    timeout: Duration,
) -> Result<(Catalog, LoadReport), LoadError> {
    let started = Instant::now();
    let deadline = started + timeout;

    let (files, discovery) = discover_files(source.as_ref()).await;

    let mut set = JoinSet::new();
    for (index, file) in files.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        set.spawn(async move {
            let result = load_file(source.as_ref(), &file).await;
            (index, file, result)
        });
    }

    // Keyed by discovery index so duplicate names resolve deterministically
    let mut records: BTreeMap<usize, (String, Specialization)> = BTreeMap::new();
    let mut failed = Vec::new();
    let mut finished = vec![false; files.len()];
    let mut timed_out = false;

    loop {
        match tokio::time::timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((index, file, result)))) => {
                finished[index] = true;
                match result {
                    Ok(spec) => {
                        records.insert(index, (file, spec));
                    }
                    Err(e) => {
                        warn!(file = %file, error = %e, "failed to load specialization");
                        failed.push((file, e.to_string()));
                    }
                }
            }
            Ok(Some(Err(e))) => warn!(error = %e, "specialization load task failed"),
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                set.abort_all();
                break;
            }
        }
    }

    if timed_out {
        let pending: Vec<_> = files
            .iter()
            .zip(&finished)
            .filter(|(_, done)| !**done)
            .map(|(file, _)| file.clone())
            .collect();
        warn!(
            pending = pending.len(),
            timeout_secs = timeout.as_secs_f64(),
            "catalog load timed out, keeping records loaded so far"
        );
        failed.extend(pending.into_iter().map(|f| (f, "timed out".to_string())));
    }

    let loaded: Vec<String> = records.values().map(|(file, _)| file.clone()).collect();
    let catalog = Catalog::load(records.into_values().map(|(_, spec)| spec)).map_err(|e| match e {
        CatalogError::Empty => LoadError::NothingLoaded,
        other => LoadError::Catalog(other),
    })?;

    info!(
        source = %source.describe(),
        discovery = ?discovery,
        loaded = loaded.len(),
        failed = failed.len(),
        specializations = catalog.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "catalog loaded"
    );

    Ok((
        catalog,
        LoadReport {
            discovery,
            loaded,
            failed,
            timed_out,
        },
    ))
}
