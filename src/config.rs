//! Store configuration
//!
//! Stored as JSON, by default in ~/.config/rtconf/config.json:
//!
//! ```json
//! { "namespace": "default", "watch_timeout_ms": 60000 }
//! ```

use crate::trie::SEPARATOR;
use crate::watch::DEFAULT_WATCH_TIMEOUT_MS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default namespace under which keys are stored
pub const DEFAULT_NAMESPACE: &str = "default";

/// Configuration for a store instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root namespace of the store
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// How long a watch blocks without an update, in milliseconds
    #[serde(default = "default_watch_timeout_ms")]
    pub watch_timeout_ms: u64,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_watch_timeout_ms() -> u64 {
    DEFAULT_WATCH_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            namespace: default_namespace(),
            watch_timeout_ms: default_watch_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: StoreConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (~/.config/rtconf/config.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rtconf").join("config.json"))
    }

    /// Load from `path` if given, else from the default location if it
    /// exists, else fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".into()));
        }
        if self.namespace.contains(SEPARATOR) {
            return Err(Error::Config(format!(
                "namespace {:?} must not contain {:?}",
                self.namespace, SEPARATOR
            )));
        }
        if self.watch_timeout_ms == 0 {
            return Err(Error::Config("watch_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn watch_timeout(&self) -> Duration {
        Duration::from_millis(self.watch_timeout_ms)
    }
}
