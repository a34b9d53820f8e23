//! Decoder/fetcher doubles and a controller harness

use super::fake_engine::{fake_engine, EngineProbe, FakeEngine};
use futures::future::BoxFuture;
use monotrack_common::events::{EventBus, PlayerEvent};
use monotrack_player::audio::{Track, TrackDecoder};
use monotrack_player::config::PlaybackConfig;
use monotrack_player::error::{Error, Result};
use monotrack_player::playback::{Fetch, PlaybackController, Resource, ResourceFetcher, Wakeup};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Sample rate of tracks built by `SecondsDecoder`
pub const FAKE_RATE: u32 = 100;

/// Decodes N bytes into an N-second silent stereo track; zero bytes fail.
pub struct SecondsDecoder;

impl TrackDecoder for SecondsDecoder {
    fn decode(&self, bytes: Vec<u8>, _hint: Option<&str>) -> Result<Track> {
        let frames = bytes.len() * FAKE_RATE as usize;
        Track::new(vec![0.0; frames * 2], FAKE_RATE, 2)
            .ok_or_else(|| Error::Decode("no audio frames".to_string()))
    }
}

/// An in-memory resource that `SecondsDecoder` turns into `n` seconds
pub fn seconds(n: usize) -> Resource {
    Resource::memory(vec![0u8; n], Some("fake"))
}

/// A resource whose decode always fails
pub fn failing_resource() -> Resource {
    Resource::memory(Vec::<u8>::new(), Some("fake"))
}

/// Memory fetcher that delays resources hinted `"slow"`
pub struct SlowFetch {
    pub delay: Duration,
}

impl Fetch for SlowFetch {
    fn fetch(&self, resource: &Resource) -> BoxFuture<'static, Result<Vec<u8>>> {
        let delay = if resource.hint().as_deref() == Some("slow") {
            self.delay
        } else {
            Duration::ZERO
        };
        let inner = ResourceFetcher::new().fetch(resource);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            inner.await
        })
    }
}

/// Controller over a `FakeEngine`, with its probe and an event subscription
pub struct Harness {
    pub controller: PlaybackController<FakeEngine>,
    pub probe: EngineProbe,
    pub events: broadcast::Receiver<PlayerEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        Self::build(config, Arc::new(ResourceFetcher::new()))
    }

    pub fn with_fetch(fetcher: Arc<dyn Fetch>) -> Self {
        Self::build(PlaybackConfig::default(), fetcher)
    }

    fn build(config: PlaybackConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let (engine, probe, notices) = fake_engine();
        let bus = Arc::new(EventBus::new(1024));
        let events = bus.subscribe();
        let controller = PlaybackController::new(
            engine,
            notices,
            Arc::new(SecondsDecoder),
            fetcher,
            bus,
            &config,
        );
        Self {
            controller,
            probe,
            events,
        }
    }

    /// Request a load and process wakeups until a load outcome arrives
    pub async fn load(&mut self, resource: Resource) {
        self.controller.request_load(resource);
        self.settle_load().await;
    }

    /// Process wakeups until one load outcome has been handled
    pub async fn settle_load(&mut self) {
        loop {
            let wakeup = tokio::time::timeout(Duration::from_secs(5), self.controller.next_wakeup())
                .await
                .expect("load did not complete");
            let loaded = matches!(wakeup, Wakeup::Loaded(_));
            self.controller.handle_wakeup(wakeup);
            if loaded {
                return;
            }
        }
    }

    /// Deliver any pending engine notices (completion, device loss)
    pub async fn pump_notice(&mut self) {
        let wakeup = tokio::time::timeout(Duration::from_secs(5), self.controller.next_wakeup())
            .await
            .expect("no wakeup");
        self.controller.handle_wakeup(wakeup);
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        drain_events(&mut self.events)
    }
}

/// Collect every event already queued on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
