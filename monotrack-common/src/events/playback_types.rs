//! Playback-related type definitions
//!
//! The transport mode and the faults a UI layer may need to display.

use serde::{Deserialize, Serialize};

/// Transport mode of the playback controller
///
/// Every UI-visible control is derived from this single value. There is no
/// separate "is playing" or "has reached end" flag to drift out of sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// No track loaded (or a load is in flight)
    #[default]
    Idle,
    /// Track loaded, stopped at the frozen position
    Ready,
    /// Audio is advancing
    Playing,
    /// Stopped mid-track at the frozen position
    Paused,
    /// Played to the end; position pinned to the duration
    Ended,
}

impl PlaybackMode {
    /// Whether a track is installed and transport commands apply
    pub fn has_track(self) -> bool {
        !matches!(self, PlaybackMode::Idle)
    }

    /// Whether the position is currently advancing
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackMode::Playing)
    }
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Idle => write!(f, "idle"),
            PlaybackMode::Ready => write!(f, "ready"),
            PlaybackMode::Playing => write!(f, "playing"),
            PlaybackMode::Paused => write!(f, "paused"),
            PlaybackMode::Ended => write!(f, "ended"),
        }
    }
}

/// Failure surfaced to the UI through the observable state
///
/// Faults are reported, never thrown across the async boundary: the caller
/// that issued a load may no longer be the one that needs to react.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerFault {
    /// Fetch or decode failed. Recoverable with a fresh load.
    LoadFailed { reason: String },
    /// Output device could not be opened or failed mid-stream. Fatal for the session.
    DeviceUnavailable { reason: String },
}

impl std::fmt::Display for PlayerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerFault::LoadFailed { reason } => write!(f, "load failed: {}", reason),
            PlayerFault::DeviceUnavailable { reason } => {
                write!(f, "audio device unavailable: {}", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_idle() {
        assert_eq!(PlaybackMode::default(), PlaybackMode::Idle);
        assert!(!PlaybackMode::Idle.has_track());
        assert!(PlaybackMode::Ended.has_track());
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_string(&PlaybackMode::Paused).unwrap();
        assert_eq!(json, "\"paused\"");
        assert_eq!(PlaybackMode::Ended.to_string(), "ended");
    }

    #[test]
    fn test_fault_serializes_with_kind_tag() {
        let fault = PlayerFault::LoadFailed {
            reason: "connection refused".to_string(),
        };
        let value = serde_json::to_value(&fault).unwrap();
        assert_eq!(value["kind"], "load_failed");
        assert_eq!(value["reason"], "connection refused");
    }
}
