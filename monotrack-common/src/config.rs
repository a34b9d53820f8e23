//! Configuration file resolution
//!
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`<config_dir>/monotrack/config.toml`)
//! 4. None: caller falls back to built-in defaults

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MONOTRACK_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR_NAME: &str = "monotrack";

/// Locates the bootstrap TOML file for a Monotrack binary
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Use a different environment variable (tests, embedded hosts)
    pub fn with_env_var(env_var_name: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
        }
    }

    /// Resolve the config file path.
    ///
    /// An explicitly requested file (CLI or environment) must exist; the
    /// per-user default is only used when present. Returns `Ok(None)` when no
    /// file applies and built-in defaults should be used.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return require_exists(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                return require_exists(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config file
        if let Some(path) = default_config_path() {
            if path.exists() {
                debug!("Using per-user config file: {}", path.display());
                return Ok(Some(path));
            }
        }

        debug!("No config file found, using built-in defaults");
        Ok(None)
    }

    /// Resolve and read the config file contents, if any.
    pub fn read(&self, cli_arg: Option<&Path>) -> Result<Option<(PathBuf, String)>> {
        match self.resolve(cli_arg)? {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)?;
                Ok(Some((path, contents)))
            }
            None => Ok(None),
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn require_exists(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        warn!("Requested config file does not exist: {}", path.display());
        Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )))
    }
}

/// Platform default: `~/.config/monotrack/config.toml` on Linux,
/// `~/Library/Application Support/monotrack/config.toml` on macOS,
/// `%APPDATA%\monotrack\config.toml` on Windows.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}
