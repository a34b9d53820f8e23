//! Configuration for monotrack-player
//!
//! Bootstrap settings come from a TOML file (located by
//! `monotrack_common::config::ConfigResolver`) with built-in defaults for
//! every key. Command-line arguments override the file in `main.rs`.
//!
//! ```toml
//! [playback]
//! tick_rate_hz = 60
//! end_detection = "epsilon"   # or "floor"
//! end_epsilon_seconds = 0.001
//! initial_volume = 1.0
//!
//! [audio]
//! device = "Built-in Output"
//!
//! [server]
//! port = 5741
//! bind = "127.0.0.1"
//!
//! [logging]
//! level = "info"
//! file = "/tmp/monotrack.log"
//! ```

use crate::error::{Error, Result};
use crate::playback::anchor::{EndDetection, EndRule};
use monotrack_common::config::ConfigResolver;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete player configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub playback: PlaybackConfig,
    pub audio: AudioConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Transport and position reporting
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Position reporter rate while playing (display frame rate)
    pub tick_rate_hz: u32,
    pub end_detection: EndDetection,
    /// Tolerance for `end_detection = "epsilon"`
    pub end_epsilon_seconds: f64,
    /// Volume at startup, 0.0-1.0 (0 starts muted)
    pub initial_volume: f32,
    /// Event bus buffer before slow subscribers start lagging
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            end_detection: EndDetection::Epsilon,
            end_epsilon_seconds: 0.001,
            initial_volume: 1.0,
            event_capacity: 256,
        }
    }
}

impl PlaybackConfig {
    pub fn end_rule(&self) -> EndRule {
        EndRule::new(self.end_detection, self.end_epsilon_seconds)
    }
}

/// Output device selection
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Output device name; the default device is used when absent or not found
    pub device: Option<String>,
}

/// HTTP control surface
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5741,
            bind: "127.0.0.1".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PlayerConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Locate and load the config file, or fall back to defaults when none exists.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match ConfigResolver::new().read(cli_path)? {
            Some((path, text)) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;
        if playback.tick_rate_hz == 0 || playback.tick_rate_hz > 1000 {
            return Err(Error::Config(format!(
                "playback.tick_rate_hz must be 1-1000, got {}",
                playback.tick_rate_hz
            )));
        }
        if !playback.end_epsilon_seconds.is_finite() || playback.end_epsilon_seconds < 0.0 {
            return Err(Error::Config(format!(
                "playback.end_epsilon_seconds must be >= 0, got {}",
                playback.end_epsilon_seconds
            )));
        }
        if !(0.0..=1.0).contains(&playback.initial_volume) {
            return Err(Error::Config(format!(
                "playback.initial_volume must be 0.0-1.0, got {}",
                playback.initial_volume
            )));
        }
        if playback.event_capacity == 0 {
            return Err(Error::Config(
                "playback.event_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
