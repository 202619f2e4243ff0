//! Error types shared across the core.

use thiserror::Error;

/// A raw specialization record failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid specialization record: {}", .errors.join(", "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("invalid roster position: group {group}, slot {slot}")]
    InvalidPosition { group: u32, slot: u32 },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no specializations could be loaded")]
    Empty,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("corrupt composition snapshot: {0}")]
    Corrupt(String),
    #[error("snapshot store error: {0}")]
    Store(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to list specialization files: {0}")]
    Listing(String),
    #[error("failed to read manifest: {0}")]
    Manifest(String),
    #[error("failed to fetch {file}: {reason}")]
    Fetch { file: String, reason: String },
    #[error("invalid specialization data in {file}: {source}")]
    Invalid {
        file: String,
        #[source]
        source: ValidationError,
    },
    #[error("no valid specializations could be loaded")]
    NothingLoaded,
    #[error(transparent)]
    Catalog(CatalogError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
