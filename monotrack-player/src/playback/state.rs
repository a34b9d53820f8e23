//! Observable playback state and transport commands

use crate::playback::loader::Resource;
use monotrack_common::events::{PlaybackMode, PlayerFault};
use serde::Serialize;

/// What a UI binds to. Every control is derivable from `mode`; the numeric
/// fields are display data, not independent flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub mode: PlaybackMode,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// 0.0-100.0
    pub progress_percent: f64,
    pub is_muted: bool,
    /// Last non-zero volume level, 0.0-1.0
    pub volume: f32,
    pub error: Option<PlayerFault>,
}

impl PlayerSnapshot {
    pub fn idle(volume: f32) -> Self {
        Self {
            mode: PlaybackMode::Idle,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            progress_percent: 0.0,
            is_muted: false,
            volume,
            error: None,
        }
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self::idle(1.0)
    }
}

/// Transport commands accepted by the controller.
///
/// Commands that do not apply to the current mode are silently ignored.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Play,
    Pause,
    /// Play unless playing, else pause
    Toggle,
    /// Seek to a percentage of the track (0-100, clamped)
    Seek { percent: f64 },
    Mute,
    Unmute,
    /// Set the volume level (0.0-1.0); 0 mutes
    SetVolume { level: f32 },
    Load { resource: Resource },
    /// Tear the controller down and release the device
    Shutdown,
}

/// Mute flag plus the level restored on unmute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuteState {
    pub muted: bool,
    /// Always > 0
    pub volume: f32,
}

impl MuteState {
    pub fn new(volume: f32) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        Self {
            muted: volume == 0.0,
            volume: if volume > 0.0 { volume } else { 1.0 },
        }
    }

    /// Gain the output stage should apply
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }
}
