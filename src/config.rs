// Configuration for the taskdb CLI

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::connection::ConnectionConfig;

/// Top-level configuration file
///
/// ```yaml
/// database: /var/lib/taskdb/tasks.db
/// pool:
///   pool_size: 4
///   busy_timeout_ms: 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database: PathBuf,
    pub pool: ConnectionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            pool: ConnectionConfig::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading config");

        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// `<data dir>/taskdb/tasks.db`, or `./tasks.db` when there is no data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("taskdb").join("tasks.db"))
        .unwrap_or_else(|| PathBuf::from("tasks.db"))
}
