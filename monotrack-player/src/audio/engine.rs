//! Audio capability seams
//!
//! The controller talks to the platform through these traits only. The cpal
//! implementation lives in `output`, the symphonia one in `decoder`; tests
//! substitute fakes with a hand-driven clock.

use crate::audio::Track;
use crate::error::Result;
use tokio::sync::mpsc;

/// Handle to one playable source created by an `AudioEngine`.
///
/// Ids are never reused within an engine, so a completion notice for a source
/// that has since been replaced can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Asynchronous notifications from the engine (usually the audio thread)
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    /// The source played to the end of its buffer without being stopped
    SourceEnded(SourceId),
    /// The output stream failed; the device cannot be used any more
    DeviceLost(String),
}

/// Sender half handed to an engine at construction
pub type NoticeSender = mpsc::UnboundedSender<EngineNotice>;

/// Receiver half consumed by the controller's event loop
pub type NoticeReceiver = mpsc::UnboundedReceiver<EngineNotice>;

/// Audio output capability: sources, gain, and the hardware clock.
///
/// A source is single-use: once started and stopped (or ended) it is never
/// started again. Callers create a fresh source for every start.
pub trait AudioEngine: Send + 'static {
    /// Monotonic, free-running clock in seconds since the device was opened.
    /// Keeps advancing while nothing is playing.
    fn current_time(&self) -> f64;

    /// Prepare a source that will play `track` once started.
    fn create_source(&mut self, track: &Track) -> Result<SourceId>;

    /// Begin feeding `source` to the device from `offset_seconds` into the track.
    fn start(&mut self, source: SourceId, offset_seconds: f64) -> Result<()>;

    /// Silence and discard `source`. Unknown or already-finished ids are ignored.
    fn stop(&mut self, source: SourceId);

    /// Output gain, 0.0 (silent) to 1.0 (unity)
    fn set_gain(&mut self, level: f32);

    /// Release the device. Called exactly once, on controller teardown.
    fn close(&mut self);
}

/// Decoding capability: encoded bytes in, a playable `Track` out.
///
/// Runs on the blocking pool, so implementations may take their time.
pub trait TrackDecoder: Send + Sync + 'static {
    /// Decode a complete encoded buffer.
    ///
    /// `hint` is a file extension (`"mp3"`, `"flac"`, ...) when one is known.
    fn decode(&self, bytes: Vec<u8>, hint: Option<&str>) -> Result<Track>;
}
