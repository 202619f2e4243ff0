//! Planner Configuration
//!
//! Where records, icons and the saved composition live, plus the load
//! timeout and tracing settings. Every field has a default, so a partial
//! JSON file (or none at all) yields a usable config.

use crate::constants::{FALLBACK_ICON, LOAD_TIMEOUT_SECS};
use crate::error::ConfigError;
use crate::logging::TracingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Planner settings, loaded from a JSON file or defaulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Local directory of specialization records
    pub specializations_dir: PathBuf,
    /// When set, records and icons are fetched from this server instead
    pub server_url: Option<String>,
    /// Root that icon paths are resolved against for local probing
    pub static_root: PathBuf,
    /// Key-value file holding the saved composition
    pub snapshot_path: PathBuf,
    pub load_timeout_secs: u64,
    pub fallback_icon: String,
    pub tracing: TracingConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            specializations_dir: PathBuf::from("static/specializations"),
            server_url: None,
            static_root: PathBuf::from("static"),
            snapshot_path: PathBuf::from("raid_composition.json"),
            load_timeout_secs: LOAD_TIMEOUT_SECS,
            fallback_icon: FALLBACK_ICON.into(),
            tracing: TracingConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Read `path` if it exists, otherwise defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.load_timeout(), Duration::from_secs(10));
        assert_eq!(config.fallback_icon, "raidicons/invalid.png");
        assert!(config.server_url.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = PlannerConfig::from_json(
            r#"{"server_url": "http://localhost:8000", "tracing": {"default_level": "debug"}}"#,
        )
        .unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.tracing.default_level, LogLevel::Debug);
        assert_eq!(config.load_timeout_secs, LOAD_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PlannerConfig::from_json("{nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let mut config = PlannerConfig::default();
        config.load_timeout_secs = 3;
        std::fs::write(&path, config.to_json()).unwrap();

        assert_eq!(PlannerConfig::load(&path).unwrap(), config);
        assert_eq!(
            PlannerConfig::load_or_default(dir.path().join("missing.json")).unwrap(),
            PlannerConfig::default()
        );
        assert!(matches!(
            PlannerConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
