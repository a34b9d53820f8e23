//! Fake audio engine
//!
//! The clock only moves when a test calls `EngineProbe::advance`. Every
//! engine call is recorded in a shared ledger so the test can inspect it
//! after the engine has been moved into a controller.

use monotrack_player::audio::{AudioEngine, EngineNotice, NoticeReceiver, NoticeSender, SourceId, Track};
use monotrack_player::error::{Error, Result};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
pub struct Ledger {
    pub now: f64,
    pub next_id: u64,
    /// Sources started and not yet stopped or ended
    pub live: BTreeSet<SourceId>,
    /// Every source ever started, in order, with its offset
    pub starts: Vec<(SourceId, f64)>,
    pub stops: Vec<SourceId>,
    pub gain: f32,
    pub closes: usize,
    pub fail_start: bool,
}

pub struct FakeEngine {
    ledger: Arc<Mutex<Ledger>>,
}

/// Test-side view of a `FakeEngine`
#[derive(Clone)]
pub struct EngineProbe {
    ledger: Arc<Mutex<Ledger>>,
    notices: NoticeSender,
}

/// Build an engine, its probe, and the notice receiver for the controller
pub fn fake_engine() -> (FakeEngine, EngineProbe, NoticeReceiver) {
    let ledger = Arc::new(Mutex::new(Ledger {
        gain: 1.0,
        ..Default::default()
    }));
    let (tx, rx) = mpsc::unbounded_channel();
    (
        FakeEngine {
            ledger: Arc::clone(&ledger),
        },
        EngineProbe { ledger, notices: tx },
        rx,
    )
}

impl AudioEngine for FakeEngine {
    fn current_time(&self) -> f64 {
        self.ledger.lock().unwrap().now
    }

    fn create_source(&mut self, _track: &Track) -> Result<SourceId> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.next_id += 1;
        Ok(SourceId(ledger.next_id))
    }

    fn start(&mut self, source: SourceId, offset_seconds: f64) -> Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.fail_start {
            return Err(Error::AudioOutput("start refused".to_string()));
        }
        assert!(
            !ledger.starts.iter().any(|(id, _)| *id == source),
            "{} started twice",
            source
        );
        ledger.starts.push((source, offset_seconds));
        ledger.live.insert(source);
        Ok(())
    }

    fn stop(&mut self, source: SourceId) {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.live.remove(&source);
        ledger.stops.push(source);
    }

    fn set_gain(&mut self, level: f32) {
        self.ledger.lock().unwrap().gain = level;
    }

    fn close(&mut self) {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.live.clear();
        ledger.closes += 1;
    }
}

impl EngineProbe {
    /// Move the hardware clock forward
    pub fn advance(&self, seconds: f64) {
        self.ledger.lock().unwrap().now += seconds;
    }

    pub fn now(&self) -> f64 {
        self.ledger.lock().unwrap().now
    }

    pub fn live_count(&self) -> usize {
        self.ledger.lock().unwrap().live.len()
    }

    pub fn live(&self) -> Option<SourceId> {
        self.ledger.lock().unwrap().live.iter().next().copied()
    }

    pub fn starts(&self) -> Vec<(SourceId, f64)> {
        self.ledger.lock().unwrap().starts.clone()
    }

    pub fn gain(&self) -> f32 {
        self.ledger.lock().unwrap().gain
    }

    pub fn closes(&self) -> usize {
        self.ledger.lock().unwrap().closes
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.ledger.lock().unwrap().fail_start = fail;
    }

    /// Report that `source` played to its end, as the audio thread would
    pub fn finish(&self, source: SourceId) {
        self.ledger.lock().unwrap().live.remove(&source);
        self.notices.send(EngineNotice::SourceEnded(source)).unwrap();
    }

    /// Report a stream failure
    pub fn lose_device(&self, reason: &str) {
        self.notices
            .send(EngineNotice::DeviceLost(reason.to_string()))
            .unwrap();
    }
}
