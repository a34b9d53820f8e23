//! Output graph: the live source and the gain stage
//!
//! Owns the `AudioEngine`. At most one source is live at any time;
//! `start_source` stops the current one before creating a fresh source, and
//! a stopped source is never started again.

use crate::audio::{AudioEngine, SourceId, Track};
use crate::error::Result;
use tracing::{debug, info};

pub struct OutputGraph<E: AudioEngine> {
    engine: E,
    live: Option<SourceId>,
    gain: f32,
    closed: bool,
}

impl<E: AudioEngine> OutputGraph<E> {
    pub fn new(mut engine: E, gain: f32) -> Self {
        let gain = gain.clamp(0.0, 1.0);
        engine.set_gain(gain);
        Self {
            engine,
            live: None,
            gain,
            closed: false,
        }
    }

    /// Current hardware clock reading
    pub fn now(&self) -> f64 {
        self.engine.current_time()
    }

    /// Start a new source for `track` at `offset_seconds`, stopping any live
    /// source first.
    pub fn start_source(&mut self, track: &Track, offset_seconds: f64) -> Result<SourceId> {
        self.stop_source();

        let id = self.engine.create_source(track)?;
        if let Err(e) = self.engine.start(id, offset_seconds) {
            self.engine.stop(id);
            return Err(e);
        }

        debug!("Live source is now {} (offset {:.3}s)", id, offset_seconds);
        self.live = Some(id);
        Ok(id)
    }

    /// Stop the live source, if any. Returns the id that was stopped.
    pub fn stop_source(&mut self) -> Option<SourceId> {
        let id = self.live.take()?;
        self.engine.stop(id);
        Some(id)
    }

    /// Record that `id` finished on its own.
    ///
    /// Returns `true` only when `id` is the live source; completions from
    /// sources that were already stopped or replaced are stale.
    pub fn source_finished(&mut self, id: SourceId) -> bool {
        if self.live == Some(id) {
            self.live = None;
            true
        } else {
            false
        }
    }

    pub fn live_source(&self) -> Option<SourceId> {
        self.live
    }

    /// Set output gain. Safe in every playback mode.
    pub fn set_gain(&mut self, level: f32) {
        self.gain = level.clamp(0.0, 1.0);
        self.engine.set_gain(self.gain);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Stop everything and release the device. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.stop_source();
        self.engine.close();
        self.closed = true;
        info!("Output graph closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Records every engine call
    #[derive(Default)]
    struct RecordingEngine {
        next: u64,
        started: Vec<(SourceId, f64)>,
        stopped: Vec<SourceId>,
        gain: f32,
        closes: usize,
        fail_start: bool,
    }

    impl AudioEngine for RecordingEngine {
        fn current_time(&self) -> f64 {
            0.0
        }

        fn create_source(&mut self, _track: &Track) -> Result<SourceId> {
            self.next += 1;
            Ok(SourceId(self.next))
        }

        fn start(&mut self, source: SourceId, offset_seconds: f64) -> Result<()> {
            if self.fail_start {
                return Err(Error::AudioOutput("start refused".to_string()));
            }
            self.started.push((source, offset_seconds));
            Ok(())
        }

        fn stop(&mut self, source: SourceId) {
            self.stopped.push(source);
        }

        fn set_gain(&mut self, level: f32) {
            self.gain = level;
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn track() -> Track {
        Track::new(vec![0.0; 2000], 1000, 2).unwrap()
    }

    #[test]
    fn test_start_replaces_live_source() {
        let mut graph = OutputGraph::new(RecordingEngine::default(), 1.0);
        let first = graph.start_source(&track(), 0.0).unwrap();
        let second = graph.start_source(&track(), 0.5).unwrap();

        assert_ne!(first, second);
        assert_eq!(graph.live_source(), Some(second));
        assert_eq!(graph.engine().stopped, vec![first]);
        assert_eq!(graph.engine().started, vec![(first, 0.0), (second, 0.5)]);
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut graph = OutputGraph::new(RecordingEngine::default(), 1.0);
        let first = graph.start_source(&track(), 0.0).unwrap();
        let second = graph.start_source(&track(), 0.0).unwrap();

        assert!(!graph.source_finished(first));
        assert!(graph.source_finished(second));
        assert_eq!(graph.live_source(), None);
    }

    #[test]
    fn test_failed_start_leaves_no_live_source() {
        let engine = RecordingEngine {
            fail_start: true,
            ..Default::default()
        };
        let mut graph = OutputGraph::new(engine, 1.0);

        assert!(graph.start_source(&track(), 0.0).is_err());
        assert_eq!(graph.live_source(), None);
        assert_eq!(graph.engine().stopped.len(), 1);
    }

    #[test]
    fn test_gain_clamped_and_forwarded() {
        let mut graph = OutputGraph::new(RecordingEngine::default(), 0.5);
        assert_eq!(graph.engine().gain, 0.5);

        graph.set_gain(3.0);
        assert_eq!(graph.gain(), 1.0);
        assert_eq!(graph.engine().gain, 1.0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut graph = OutputGraph::new(RecordingEngine::default(), 1.0);
        let live = graph.start_source(&track(), 0.0).unwrap();

        graph.close();
        graph.close();

        assert!(graph.is_closed());
        assert_eq!(graph.engine().closes, 1);
        assert_eq!(graph.engine().stopped, vec![live]);
    }
}
