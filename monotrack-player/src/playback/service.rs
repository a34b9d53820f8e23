//! Player service: the task that owns the controller
//!
//! `PlayerService::spawn` moves a `PlaybackController` onto its own tokio
//! task. The task multiplexes inbound commands with the controller's own
//! wakeups (load completions, engine notices, reporter ticks) in one
//! `select!` loop, so controller state is never shared or locked.
//!
//! Callers hold a cloneable `PlayerHandle`. The task tears the controller
//! down on `shutdown()` or when the last handle is dropped.

use crate::audio::{AudioEngine, CpalEngine, SymphoniaDecoder};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::playback::controller::PlaybackController;
use crate::playback::loader::{Resource, ResourceFetcher};
use crate::playback::state::{PlayerCommand, PlayerSnapshot};
use monotrack_common::events::{EventBus, PlayerEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Command queue depth between handles and the service task
const COMMAND_CAPACITY: usize = 64;

/// Cloneable front end to a running player service
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: Arc<EventBus>,
}

impl PlayerHandle {
    /// Queue a command. Fails only when the service has stopped.
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::InvalidState("player service has stopped".to_string()))
    }

    pub async fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(PlayerCommand::Toggle).await
    }

    pub async fn seek(&self, percent: f64) -> Result<()> {
        self.send(PlayerCommand::Seek { percent }).await
    }

    pub async fn mute(&self) -> Result<()> {
        self.send(PlayerCommand::Mute).await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.send(PlayerCommand::Unmute).await
    }

    pub async fn set_volume(&self, level: f32) -> Result<()> {
        self.send(PlayerCommand::SetVolume { level }).await
    }

    pub async fn load(&self, resource: Resource) -> Result<()> {
        self.send(PlayerCommand::Load { resource }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Whether the service task has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

pub struct PlayerService;

impl PlayerService {
    /// Move `controller` onto a new task and return a handle to it.
    pub fn spawn<E: AudioEngine>(
        controller: PlaybackController<E>,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = PlayerHandle {
            commands: tx,
            snapshots: controller.snapshots(),
            events: Arc::clone(controller.events()),
        };
        let task = tokio::spawn(run(controller, rx));
        (handle, task)
    }

    /// Open the configured output device and start a player on it.
    ///
    /// Decoded tracks are resampled to the device rate.
    pub fn start_default(config: &PlayerConfig) -> Result<(PlayerHandle, JoinHandle<()>)> {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let engine = CpalEngine::open(config.audio.device.clone(), notice_tx)?;
        info!(
            "Audio output: {} at {} Hz",
            engine.device_name(),
            engine.sample_rate()
        );

        let decoder = Arc::new(SymphoniaDecoder::new(engine.sample_rate()));
        let fetcher = Arc::new(ResourceFetcher::new());
        let events = Arc::new(EventBus::new(config.playback.event_capacity));
        let controller = PlaybackController::new(
            engine,
            notice_rx,
            decoder,
            fetcher,
            events,
            &config.playback,
        );
        Ok(Self::spawn(controller))
    }
}

async fn run<E: AudioEngine>(
    mut controller: PlaybackController<E>,
    mut commands: mpsc::Receiver<PlayerCommand>,
) {
    debug!("Player service started");
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    if !controller.apply(command) {
                        break;
                    }
                }
                None => {
                    debug!("All player handles dropped");
                    break;
                }
            },
            wakeup = controller.next_wakeup() => controller.handle_wakeup(wakeup),
        }
    }
    controller.teardown();
    info!("Player service stopped");
}
