use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "tracker.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection settings for the parcel database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Upper bound on how long a single call waits for a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl TrackerConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Load config from `~/.config/tracker/config.json`, falling back to
    /// defaults when the file does not exist.
    pub fn load_default() -> Result<Self, StorageError> {
        let path = default_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Config(format!("invalid tracker config: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_config_path() -> Result<PathBuf, StorageError> {
    let home =
        std::env::var("HOME").map_err(|_| StorageError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/tracker/config.json"))
}
