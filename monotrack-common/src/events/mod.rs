//! Event types for the Monotrack event system
//!
//! Provides the shared event definitions and the `EventBus` used to fan them
//! out to UI layers (SSE, logging, tests).

mod playback_types;

pub use playback_types::{PlaybackMode, PlayerFault};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Monotrack event types
///
/// Events are broadcast via `EventBus` and serialized for SSE transmission.
/// The `type` tag doubles as the SSE event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Transport mode changed
    ModeChanged {
        old_mode: PlaybackMode,
        new_mode: PlaybackMode,
        timestamp: DateTime<Utc>,
    },

    /// Playback position update
    ///
    /// Emitted at display rate while playing, and once on every transition
    /// that moves the frozen position (pause, seek, end).
    Progress {
        position_seconds: f64,
        duration_seconds: f64,
        /// 0.0-100.0
        progress_percent: f64,
        timestamp: DateTime<Utc>,
    },

    /// A track finished decoding and was installed
    TrackLoaded {
        /// Resource description (URL, path, or `<memory>`)
        resource: String,
        duration_seconds: f64,
        sample_rate: u32,
        channels: u16,
        timestamp: DateTime<Utc>,
    },

    /// Fetch or decode failed; the controller stays idle
    LoadFailed {
        resource: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Track played to its end
    PlaybackEnded {
        duration_seconds: f64,
        timestamp: DateTime<Utc>,
    },

    /// Mute state or volume changed
    MuteChanged {
        is_muted: bool,
        /// Last non-zero volume level (restored on unmute)
        volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// Output device failed. Emitted once per session.
    DeviceUnavailable {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::ModeChanged { .. } => "ModeChanged",
            PlayerEvent::Progress { .. } => "Progress",
            PlayerEvent::TrackLoaded { .. } => "TrackLoaded",
            PlayerEvent::LoadFailed { .. } => "LoadFailed",
            PlayerEvent::PlaybackEnded { .. } => "PlaybackEnded",
            PlayerEvent::MuteChanged { .. } => "MuteChanged",
            PlayerEvent::DeviceUnavailable { .. } => "DeviceUnavailable",
        }
    }
}

/// One-to-many event distribution built on `tokio::sync::broadcast`
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// emitter; progress events are superseded by the next tick anyway.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use monotrack_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
