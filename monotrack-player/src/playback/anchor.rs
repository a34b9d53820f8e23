//! Hardware clock to logical position mapping
//!
//! Every position the controller reports while playing comes from
//! `AnchorClock::position_at`. Pause, tick, seek and snapshot all evaluate
//! the same formula, so they cannot drift apart.

use serde::Deserialize;

/// Snapshot pairing a hardware-clock reading with the logical position at
/// that instant. Recorded on play/resume and on every seek while playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorClock {
    hardware_at_anchor: f64,
    position_at_anchor: f64,
}

impl AnchorClock {
    pub fn new(hardware_now: f64, position: f64) -> Self {
        Self {
            hardware_at_anchor: hardware_now,
            position_at_anchor: position,
        }
    }

    /// `position_at_anchor + (hardware_now - hardware_at_anchor)`, clamped to
    /// `[0, duration]`.
    ///
    /// A clock reading earlier than the anchor counts as zero elapsed time, so
    /// the result never moves backwards for a monotonic clock.
    pub fn position_at(&self, hardware_now: f64, duration: f64) -> f64 {
        let elapsed = (hardware_now - self.hardware_at_anchor).max(0.0);
        (self.position_at_anchor + elapsed).clamp(0.0, duration.max(0.0))
    }

    pub fn position_at_anchor(&self) -> f64 {
        self.position_at_anchor
    }
}

/// How the end of the track is recognised from a computed position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndDetection {
    /// `position >= duration - epsilon`
    #[default]
    Epsilon,
    /// `floor(position) >= floor(duration)`: whole-second comparison that
    /// tolerates the clock and the decoded duration rounding differently
    Floor,
}

/// End-of-track rule applied identically by every detection path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndRule {
    pub detection: EndDetection,
    pub epsilon: f64,
}

impl EndRule {
    pub fn new(detection: EndDetection, epsilon: f64) -> Self {
        Self {
            detection,
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn reached(&self, position: f64, duration: f64) -> bool {
        match self.detection {
            EndDetection::Epsilon => position >= duration - self.epsilon,
            EndDetection::Floor => position.floor() >= duration.floor(),
        }
    }
}

impl Default for EndRule {
    fn default() -> Self {
        Self::new(EndDetection::Epsilon, 0.001)
    }
}

/// Position as a percentage of the duration, 0.0-100.0
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (position / duration * 100.0).clamp(0.0, 100.0)
}

/// Seek target in seconds for a percentage.
///
/// Returns the target and whether the requested percentage had to be clamped
/// into `[0, 100]`. NaN counts as 0.
pub fn seek_target(percent: f64, duration: f64) -> (f64, bool) {
    let clamped = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let was_clamped = clamped != percent;
    (clamped / 100.0 * duration, was_clamped)
}
