//! Configuration loader.
//!
//! Reads `config.toml` from the config directory (`~/.goful/` by default) and
//! deserializes it into [`Config`]. A missing file yields the defaults; a
//! malformed one is logged and also yields the defaults. Command-line flags
//! are layered on top by the binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{APP_NAME, DEFAULT_TIMEOUT_SECS};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Editor executable for create/edit hand-off
    pub editor: Option<String>,
    /// Workspace directory holding request files
    pub workspace: Option<PathBuf>,
    /// Where new request files are written before editing
    pub staging_dir: Option<PathBuf>,
    /// Log file location
    pub log_file: Option<PathBuf>,
    /// Per-request timeout for executions
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Workspace root, falling back to the current directory
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Staging location, falling back to the workspace root
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(|| self.workspace_root())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_config_dir().join(format!("{}.log", APP_NAME)))
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// `~/.goful`, or `./.goful` when no home directory is known
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!(".{}", APP_NAME))
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`Config::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub fn load_config(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return Config::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            Config::default()
        }
    }
}
