//! Sync-job configuration stores.
//!
//! Product-sync and order-sync job definitions live in JSON files, one array
//! per domain. The scheduler's reload operation reads these stores and
//! rebuilds the in-memory job registry from them; nothing here is persisted
//! back; the files are the single source of truth for recurring sync jobs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One recurring sync-job definition as stored on disk.
///
/// `interval_seconds` is the only schedule shape sync configs can express;
/// jobs with richer schedules are registered through the HTTP API instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobConfig {
    pub id: String,
    pub method: String,
    pub url: String,
    #[serde(rename = "intervalSeconds")]
    pub interval_seconds: u64,
    #[serde(rename = "useSharedAuth", default)]
    pub use_shared_auth: bool,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// File-backed store of sync-job configurations.
#[derive(Debug, Clone)]
pub struct SyncConfigStore {
    path: PathBuf,
}

impl SyncConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every configuration in the store, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails
    /// validation (duplicate or empty ids).
    pub fn load(&self) -> Result<Vec<SyncJobConfig>, ConfigError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ConfigError::SyncFileIo {
                path: self.path.display().to_string(),
                source: e,
            })?;

        let configs: Vec<SyncJobConfig> =
            serde_json::from_str(&content).map_err(|e| ConfigError::SyncFileParse {
                path: self.path.display().to_string(),
                source: e,
            })?;

        validate_configs(&configs)?;

        Ok(configs)
    }

    /// Load only the configurations marked active.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SyncConfigStore::load`].
    pub fn active_configurations(&self) -> Result<Vec<SyncJobConfig>, ConfigError> {
        Ok(self.load()?.into_iter().filter(|c| c.active).collect())
    }
}

fn validate_configs(configs: &[SyncJobConfig]) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();

    for config in configs {
        if config.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sync job id must be non-empty".to_string(),
            ));
        }

        if !seen.insert(config.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate sync job id: '{}'",
                config.id
            )));
        }
    }

    Ok(())
}
