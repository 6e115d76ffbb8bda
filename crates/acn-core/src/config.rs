//! Configuration loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_DIR: &str = "acn";
const CONFIG_FILENAME: &str = "config.toml";
const LOG_FILENAME: &str = "renaming_log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Append-only rename audit log
    pub log_path: PathBuf,
    /// Report per-file progress while processing event folders
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            show_progress: false,
        }
    }
}

impl Config {
    /// Load configuration in priority order:
    /// 1. explicit file (must exist)
    /// 2. `<config dir>/acn/config.toml`, if present
    /// 3. compiled defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match user_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILENAME))
}

/// `<local data dir>/acn/renaming_log`, or `./renaming_log` when the platform has none.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join(LOG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILENAME))
}
