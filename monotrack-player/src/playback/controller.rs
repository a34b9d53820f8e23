//! Playback controller
//!
//! Synchronous state machine reconciling the free-running hardware clock with
//! the logical track position. Owns the output graph, the installed track,
//! the reporter handle and the load pipeline. All mutation happens through
//! `&mut self`, so the owning task (see `service`) serialises every command,
//! load completion, engine notice and reporter tick.

use crate::audio::{AudioEngine, EngineNotice, NoticeReceiver, Track, TrackDecoder};
use crate::config::PlaybackConfig;
use crate::playback::anchor::{progress_percent, seek_target, AnchorClock, EndRule};
use crate::playback::graph::OutputGraph;
use crate::playback::loader::{spawn_load, Fetch, LoadOutcome, Resource};
use crate::playback::reporter::{next_tick, Reporter};
use crate::playback::state::{MuteState, PlayerCommand, PlayerSnapshot};
use chrono::Utc;
use monotrack_common::events::{EventBus, PlaybackMode, PlayerEvent, PlayerFault};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

/// Transport state. Positions live inside the variant that owns them, so a
/// frozen position cannot exist while playing and vice versa.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transport {
    Idle,
    Ready { position: f64 },
    Playing { anchor: AnchorClock },
    Paused { position: f64 },
    Ended,
}

impl Transport {
    fn mode(&self) -> PlaybackMode {
        match self {
            Transport::Idle => PlaybackMode::Idle,
            Transport::Ready { .. } => PlaybackMode::Ready,
            Transport::Playing { .. } => PlaybackMode::Playing,
            Transport::Paused { .. } => PlaybackMode::Paused,
            Transport::Ended => PlaybackMode::Ended,
        }
    }
}

/// Something the controller's owner must feed back into `handle_wakeup`
#[derive(Debug)]
pub enum Wakeup {
    Loaded(LoadOutcome),
    Engine(EngineNotice),
    Tick,
}

pub struct PlaybackController<E: AudioEngine> {
    graph: OutputGraph<E>,
    transport: Transport,
    track: Option<Track>,
    mute: MuteState,
    fault: Option<PlayerFault>,
    device_failed: bool,

    reporter: Option<Reporter>,
    tick_rate_hz: u32,
    end_rule: EndRule,

    generation: u64,
    pending_load: Option<AbortHandle>,
    decoder: Arc<dyn TrackDecoder>,
    fetcher: Arc<dyn Fetch>,
    load_tx: mpsc::UnboundedSender<LoadOutcome>,
    load_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    notices: NoticeReceiver,

    events: Arc<EventBus>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    torn_down: bool,
}

impl<E: AudioEngine> PlaybackController<E> {
    pub fn new(
        engine: E,
        notices: NoticeReceiver,
        decoder: Arc<dyn TrackDecoder>,
        fetcher: Arc<dyn Fetch>,
        events: Arc<EventBus>,
        config: &PlaybackConfig,
    ) -> Self {
        let mute = MuteState::new(config.initial_volume);
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot {
            is_muted: mute.muted,
            ..PlayerSnapshot::idle(mute.volume)
        });

        Self {
            graph: OutputGraph::new(engine, mute.gain()),
            transport: Transport::Idle,
            track: None,
            mute,
            fault: None,
            device_failed: false,
            reporter: None,
            tick_rate_hz: config.tick_rate_hz,
            end_rule: config.end_rule(),
            generation: 0,
            pending_load: None,
            decoder,
            fetcher,
            load_tx,
            load_rx,
            notices,
            events,
            snapshot_tx,
            torn_down: false,
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn mode(&self) -> PlaybackMode {
        self.transport.mode()
    }

    /// Logical position in seconds. While playing this is the anchor formula
    /// evaluated at the current hardware clock.
    pub fn position(&self) -> f64 {
        match self.transport {
            Transport::Idle => 0.0,
            Transport::Ready { position } | Transport::Paused { position } => position,
            Transport::Playing { anchor } => anchor.position_at(self.graph.now(), self.duration()),
            Transport::Ended => self.duration(),
        }
    }

    /// Duration of the installed track, 0 when none is installed
    pub fn duration(&self) -> f64 {
        self.track.as_ref().map_or(0.0, Track::duration_seconds)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let position = self.position();
        let duration = self.duration();
        PlayerSnapshot {
            mode: self.mode(),
            position_seconds: position,
            duration_seconds: duration,
            progress_percent: progress_percent(position, duration),
            is_muted: self.mute.muted,
            volume: self.mute.volume,
            error: self.fault.clone(),
        }
    }

    /// Receiver that always holds the latest published snapshot
    pub fn snapshots(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn fault(&self) -> Option<&PlayerFault> {
        self.fault.as_ref()
    }

    pub fn mute_state(&self) -> MuteState {
        self.mute
    }

    pub fn graph(&self) -> &OutputGraph<E> {
        &self.graph
    }

    pub fn engine(&self) -> &E {
        self.graph.engine()
    }

    /// Whether the position reporter is running
    pub fn is_reporting(&self) -> bool {
        self.reporter.is_some()
    }

    /// Generation of the most recently requested load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply one command. Returns `false` once the controller has shut down.
    pub fn apply(&mut self, command: PlayerCommand) -> bool {
        debug!("Command: {:?} (mode {})", command, self.mode());
        match command {
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Toggle => self.toggle(),
            PlayerCommand::Seek { percent } => self.seek(percent),
            PlayerCommand::Mute => self.mute(),
            PlayerCommand::Unmute => self.unmute(),
            PlayerCommand::SetVolume { level } => self.set_volume(level),
            PlayerCommand::Load { resource } => {
                self.request_load(resource);
            }
            PlayerCommand::Shutdown => {
                self.teardown();
                return false;
            }
        }
        true
    }

    pub fn play(&mut self) {
        if self.torn_down {
            return;
        }
        if self.device_failed {
            debug!("play() ignored: output device unavailable");
            return;
        }
        match self.transport {
            Transport::Ready { position } | Transport::Paused { position } => {
                self.start_playing(position)
            }
            Transport::Ended => {
                debug!("Replaying from the start");
                self.start_playing(0.0)
            }
            Transport::Idle | Transport::Playing { .. } => {
                debug!("play() ignored in mode {}", self.mode());
            }
        }
    }

    pub fn pause(&mut self) {
        if self.torn_down {
            return;
        }
        let Transport::Playing { anchor } = self.transport else {
            debug!("pause() ignored in mode {}", self.mode());
            return;
        };

        let duration = self.duration();
        let position = anchor.position_at(self.graph.now(), duration);
        if self.end_rule.reached(position, duration) {
            self.finish();
            return;
        }

        self.reporter = None;
        self.graph.stop_source();
        self.set_transport(Transport::Paused { position });
        self.emit_progress();
        self.publish();
    }

    pub fn toggle(&mut self) {
        if self.mode().is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move to `percent` of the track. Out-of-range values are clamped.
    pub fn seek(&mut self, percent: f64) {
        if self.torn_down || !self.mode().has_track() {
            debug!("seek({}) ignored in mode {}", percent, self.mode());
            return;
        }

        let duration = self.duration();
        let (target, clamped) = seek_target(percent, duration);
        if clamped {
            warn!("Seek to {}% clamped to {:.3}s", percent, target);
        }

        match self.transport {
            Transport::Playing { .. } => {
                if self.end_rule.reached(target, duration) {
                    self.finish();
                    return;
                }
                if !self.start_source_at(target) {
                    self.reporter = None;
                    self.set_transport(Transport::Paused { position: target });
                }
            }
            Transport::Paused { .. } => self.transport = Transport::Paused { position: target },
            Transport::Ready { .. } => self.transport = Transport::Ready { position: target },
            Transport::Ended => {
                if target < duration {
                    self.set_transport(Transport::Ready { position: target });
                } else {
                    debug!("seek(100%) in ended mode keeps the track ended");
                    return;
                }
            }
            Transport::Idle => return,
        }

        debug!("Seeked to {:.3}s ({})", target, self.mode());
        self.emit_progress();
        self.publish();
    }

    pub fn mute(&mut self) {
        if self.torn_down || self.mute.muted {
            return;
        }
        self.mute.muted = true;
        self.apply_gain();
    }

    pub fn unmute(&mut self) {
        if self.torn_down || !self.mute.muted {
            return;
        }
        self.mute.muted = false;
        self.apply_gain();
    }

    /// Set the volume level. A level of 0 mutes and keeps the previous
    /// non-zero level for unmute; a level set while muted takes effect on
    /// unmute.
    pub fn set_volume(&mut self, level: f32) {
        if self.torn_down {
            return;
        }
        if !level.is_finite() {
            warn!("Ignoring non-finite volume {}", level);
            return;
        }
        let level = level.clamp(0.0, 1.0);
        if level == 0.0 {
            self.mute();
            return;
        }
        if level == self.mute.volume {
            return;
        }
        self.mute.volume = level;
        self.apply_gain();
    }

    /// Begin loading `resource`. Stops playback, drops the current track and
    /// supersedes any load still in flight. Returns the new load generation.
    pub fn request_load(&mut self, resource: Resource) -> u64 {
        if self.torn_down {
            return self.generation;
        }

        if let Some(previous) = self.pending_load.take() {
            debug!("Aborting load generation {}", self.generation);
            previous.abort();
        }
        self.generation += 1;

        self.reporter = None;
        self.graph.stop_source();
        self.track = None;
        self.set_transport(Transport::Idle);
        self.publish();

        info!("Loading {} (generation {})", resource, self.generation);
        self.pending_load = Some(spawn_load(
            self.generation,
            resource,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.decoder),
            self.load_tx.clone(),
        ));
        self.generation
    }

    // ========================================================================
    // Wakeups
    // ========================================================================

    /// Wait for the next load completion, engine notice or reporter tick.
    ///
    /// Cancel-safe: nothing is consumed unless the returned wakeup is.
    pub async fn next_wakeup(&mut self) -> Wakeup {
        tokio::select! {
            biased;
            Some(notice) = self.notices.recv() => Wakeup::Engine(notice),
            Some(outcome) = self.load_rx.recv() => Wakeup::Loaded(outcome),
            _ = next_tick(&mut self.reporter) => Wakeup::Tick,
        }
    }

    pub fn handle_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Loaded(outcome) => self.finish_load(outcome),
            Wakeup::Engine(notice) => self.on_engine_notice(notice),
            Wakeup::Tick => self.tick(),
        }
    }

    /// Install (or reject) a finished load. Outcomes from superseded
    /// generations are discarded.
    pub fn finish_load(&mut self, outcome: LoadOutcome) {
        if self.torn_down {
            return;
        }
        if outcome.generation != self.generation {
            debug!(
                "Discarding stale load of {} (generation {}, current {})",
                outcome.resource, outcome.generation, self.generation
            );
            return;
        }
        self.pending_load = None;

        match outcome.result {
            Ok(track) => {
                info!(
                    "Loaded {}: {:.3}s, {} Hz, {} ch",
                    outcome.resource,
                    track.duration_seconds(),
                    track.sample_rate(),
                    track.channels()
                );
                if matches!(self.fault, Some(PlayerFault::LoadFailed { .. })) {
                    self.fault = None;
                }
                self.events.emit_lossy(PlayerEvent::TrackLoaded {
                    resource: outcome.resource.to_string(),
                    duration_seconds: track.duration_seconds(),
                    sample_rate: track.sample_rate(),
                    channels: track.channels(),
                    timestamp: Utc::now(),
                });
                self.track = Some(track);
                self.set_transport(Transport::Ready { position: 0.0 });
            }
            Err(e) => {
                warn!("Load of {} failed: {}", outcome.resource, e);
                let reason = e.to_string();
                if !self.device_failed {
                    self.fault = Some(PlayerFault::LoadFailed {
                        reason: reason.clone(),
                    });
                }
                self.events.emit_lossy(PlayerEvent::LoadFailed {
                    resource: outcome.resource.to_string(),
                    reason,
                    timestamp: Utc::now(),
                });
            }
        }
        self.publish();
    }

    pub fn on_engine_notice(&mut self, notice: EngineNotice) {
        match notice {
            EngineNotice::SourceEnded(id) => {
                if self.graph.source_finished(id) && self.mode().is_playing() {
                    debug!("{} completed naturally", id);
                    self.finish();
                } else {
                    debug!("Ignoring completion of stale {}", id);
                }
            }
            EngineNotice::DeviceLost(reason) => self.device_lost(reason),
        }
    }

    /// Reporter tick: publish the position and check for the end of track
    pub fn tick(&mut self) {
        if !self.mode().is_playing() {
            self.reporter = None;
            return;
        }

        let position = self.position();
        if self.end_rule.reached(position, self.duration()) {
            self.finish();
            return;
        }
        self.emit_progress();
        self.publish();
    }

    /// Stop the live source, cancel the reporter, abort any in-flight load
    /// and close the device. Playing freezes into Paused at the current
    /// position. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(load) = self.pending_load.take() {
            load.abort();
        }
        self.reporter = None;
        if let Transport::Playing { anchor } = self.transport {
            let position = anchor.position_at(self.graph.now(), self.duration());
            self.set_transport(Transport::Paused { position });
        }
        self.graph.close();
        self.torn_down = true;
        self.publish();
        info!("Playback controller shut down");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn start_playing(&mut self, position: f64) {
        if self.end_rule.reached(position, self.duration()) {
            // Nothing left to play; the end is reached without a source
            self.set_transport(Transport::Playing {
                anchor: AnchorClock::new(self.graph.now(), position),
            });
            self.finish();
            return;
        }
        if self.start_source_at(position) {
            self.reporter = Some(Reporter::start(self.tick_rate_hz));
            self.emit_progress();
            self.publish();
        }
    }

    /// Start a fresh source at `position` and re-anchor. Returns `false` (and
    /// leaves the transport untouched) when the engine refuses.
    fn start_source_at(&mut self, position: f64) -> bool {
        let Some(track) = self.track.as_ref() else {
            return false;
        };
        match self.graph.start_source(track, position) {
            Ok(_) => {
                let anchor = AnchorClock::new(self.graph.now(), position);
                self.set_transport(Transport::Playing { anchor });
                true
            }
            Err(e) => {
                error!("Failed to start playback at {:.3}s: {}", position, e);
                false
            }
        }
    }

    /// Transition into Ended. Only valid from Playing, so it fires at most
    /// once per play-through.
    fn finish(&mut self) {
        if !self.mode().is_playing() {
            return;
        }
        self.reporter = None;
        self.graph.stop_source();
        self.set_transport(Transport::Ended);

        let duration = self.duration();
        info!("Playback ended at {:.3}s", duration);
        self.emit_progress();
        self.events.emit_lossy(PlayerEvent::PlaybackEnded {
            duration_seconds: duration,
            timestamp: Utc::now(),
        });
        self.publish();
    }

    fn device_lost(&mut self, reason: String) {
        if self.device_failed {
            return;
        }
        error!("Output device lost: {}", reason);
        self.device_failed = true;

        if let Transport::Playing { anchor } = self.transport {
            let position = anchor.position_at(self.graph.now(), self.duration());
            self.reporter = None;
            self.graph.stop_source();
            self.set_transport(Transport::Paused { position });
        }

        self.fault = Some(PlayerFault::DeviceUnavailable {
            reason: reason.clone(),
        });
        self.events.emit_lossy(PlayerEvent::DeviceUnavailable {
            reason,
            timestamp: Utc::now(),
        });
        self.publish();
    }

    fn apply_gain(&mut self) {
        self.graph.set_gain(self.mute.gain());
        debug!(
            "Gain now {:.2} (muted: {}, volume: {:.2})",
            self.mute.gain(),
            self.mute.muted,
            self.mute.volume
        );
        self.events.emit_lossy(PlayerEvent::MuteChanged {
            is_muted: self.mute.muted,
            volume: self.mute.volume,
            timestamp: Utc::now(),
        });
        self.publish();
    }

    fn set_transport(&mut self, next: Transport) {
        let old_mode = self.transport.mode();
        self.transport = next;
        let new_mode = next.mode();
        if old_mode != new_mode {
            debug!("Mode {} -> {}", old_mode, new_mode);
            self.events.emit_lossy(PlayerEvent::ModeChanged {
                old_mode,
                new_mode,
                timestamp: Utc::now(),
            });
        }
    }

    fn emit_progress(&self) {
        let position = self.position();
        let duration = self.duration();
        self.events.emit_lossy(PlayerEvent::Progress {
            position_seconds: position,
            duration_seconds: duration,
            progress_percent: progress_percent(position, duration),
            timestamp: Utc::now(),
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl<E: AudioEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
