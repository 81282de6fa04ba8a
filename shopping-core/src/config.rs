//! App Configuration
//!
//! Store connection and tuning, persisted as JSON next to the app data.
//! Every field has a default, so a missing or partial file still loads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_SWIPE_THRESHOLD;

/// Collection the list lives in
pub const DEFAULT_COLLECTION: &str = "shopping_items";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Firestore REST connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Database id, `(default)` unless a named database is used
    pub database: String,
    pub api_key: Option<String>,
    /// Override for the emulator, e.g. `http://localhost:8080/v1`
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: "(default)".to_string(),
            api_key: None,
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            poll_interval_ms: 2_000,
            request_timeout_ms: 10_000,
        }
    }
}

/// Which document store backs the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local store, nothing leaves the device
    #[default]
    Memory,
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub collection: String,
    pub swipe_threshold: f32,
    pub backend: BackendConfig,
    /// Rolling log files go here; no file logging when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            backend: BackendConfig::default(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
