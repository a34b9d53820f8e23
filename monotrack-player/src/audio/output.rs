//! Audio output using cpal
//!
//! `CpalEngine` keeps one output stream open for the whole session. The
//! stream always runs; with no active source it renders silence. Frames
//! rendered since the stream opened form the free-running hardware clock.
//!
//! cpal streams cannot move between threads on every platform, so the stream
//! is built and owned by a dedicated output thread that holds it until
//! `close()`.

use crate::audio::engine::{AudioEngine, EngineNotice, NoticeSender, SourceId};
use crate::audio::types::Track;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SizedSample, Stream, StreamConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// A started source as seen by the audio thread
struct PlayingSource {
    id: SourceId,
    samples: Arc<[f32]>,
    channels: usize,
    /// Next frame to render
    cursor: usize,
}

/// State shared between the controller side and the audio callback
struct Mixer {
    active: Option<PlayingSource>,
    gain: f32,
}

struct Shared {
    mixer: Mutex<Mixer>,
    frames_rendered: AtomicU64,
    device_failed: AtomicBool,
}

impl Shared {
    fn lock_mixer(&self) -> MutexGuard<'_, Mixer> {
        // A panic on the audio thread must not take the controller down with it
        self.mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `AudioEngine` backed by the system's default (or a named) output device
pub struct CpalEngine {
    shared: Arc<Shared>,
    sample_rate: u32,
    device_name: String,
    /// Created but not yet started
    pending: HashMap<SourceId, Track>,
    next_source: u64,
    close_tx: Option<std_mpsc::Sender<()>>,
    output_thread: Option<JoinHandle<()>>,
}

impl CpalEngine {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output device and start its stream.
    ///
    /// Falls back to the default device when the requested one is missing.
    /// Any failure to find a device or build/start the stream is
    /// `Error::DeviceUnavailable`.
    pub fn open(device_name: Option<String>, notices: NoticeSender) -> Result<Self> {
        let shared = Arc::new(Shared {
            mixer: Mutex::new(Mixer {
                active: None,
                gain: 1.0,
            }),
            frames_rendered: AtomicU64::new(0),
            device_failed: AtomicBool::new(false),
        });

        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(u32, String)>>();
        let (close_tx, close_rx) = std_mpsc::channel::<()>();
        let thread_shared = Arc::clone(&shared);

        let output_thread = std::thread::Builder::new()
            .name("monotrack-output".to_string())
            .spawn(move || {
                match build_output(device_name, thread_shared, notices) {
                    Ok((stream, rate, name)) => {
                        let _ = ready_tx.send(Ok((rate, name)));
                        // Hold the stream until close() (or the engine is dropped)
                        let _ = close_rx.recv();
                        drop(stream);
                        debug!("Output stream released");
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to spawn output thread: {}", e)))?;

        let (sample_rate, device_name) = ready_rx
            .recv()
            .map_err(|_| Error::DeviceUnavailable("Output thread exited during startup".to_string()))??;

        info!(
            "Audio output open: device={}, sample_rate={}",
            device_name, sample_rate
        );

        Ok(Self {
            shared,
            sample_rate,
            device_name,
            pending: HashMap::new(),
            next_source: 1,
            close_tx: Some(close_tx),
            output_thread: Some(output_thread),
        })
    }

    /// Device sample rate; decoded tracks are resampled to this
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioEngine for CpalEngine {
    fn current_time(&self) -> f64 {
        self.shared.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn create_source(&mut self, track: &Track) -> Result<SourceId> {
        if self.close_tx.is_none() {
            return Err(Error::InvalidState("Audio output is closed".to_string()));
        }
        if self.shared.device_failed.load(Ordering::Acquire) {
            return Err(Error::AudioOutput("Output device has failed".to_string()));
        }
        if track.sample_rate() != self.sample_rate {
            warn!(
                "Track rate {}Hz differs from device rate {}Hz; pitch will be off",
                track.sample_rate(),
                self.sample_rate
            );
        }

        let id = SourceId(self.next_source);
        self.next_source += 1;
        self.pending.insert(id, track.clone());
        Ok(id)
    }

    fn start(&mut self, source: SourceId, offset_seconds: f64) -> Result<()> {
        let track = self.pending.remove(&source).ok_or_else(|| {
            Error::InvalidState(format!("{} was already started or never created", source))
        })?;

        let playing = PlayingSource {
            id: source,
            samples: Arc::clone(track.samples()),
            channels: track.channels() as usize,
            cursor: track.frame_at(offset_seconds),
        };

        let mut mixer = self.shared.lock_mixer();
        if let Some(previous) = mixer.active.replace(playing) {
            warn!("{} replaced {} without an explicit stop", source, previous.id);
        }
        debug!("Started {} at {:.3}s", source, offset_seconds);
        Ok(())
    }

    fn stop(&mut self, source: SourceId) {
        self.pending.remove(&source);

        let mut mixer = self.shared.lock_mixer();
        if mixer.active.as_ref().map(|s| s.id) == Some(source) {
            mixer.active = None;
            debug!("Stopped {}", source);
        }
    }

    fn set_gain(&mut self, level: f32) {
        self.shared.lock_mixer().gain = level.clamp(0.0, 1.0);
    }

    fn close(&mut self) {
        self.pending.clear();
        self.shared.lock_mixer().active = None;

        if let Some(close_tx) = self.close_tx.take() {
            let _ = close_tx.send(());
            if let Some(handle) = self.output_thread.take() {
                if handle.join().is_err() {
                    error!("Output thread panicked during shutdown");
                }
            }
            info!("Audio output closed");
        }
    }
}

impl Drop for CpalEngine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs on the output thread: pick a device, build and start the stream.
fn build_output(
    device_name: Option<String>,
    shared: Arc<Shared>,
    notices: NoticeSender,
) -> Result<(Stream, u32, String)> {
    let device = select_device(device_name.as_deref())?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = device
        .default_output_config()
        .map_err(|e| Error::DeviceUnavailable(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();

    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, shared, notices)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, shared, notices)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, shared, notices)?,
        format => {
            return Err(Error::DeviceUnavailable(format!(
                "Unsupported sample format: {:?}",
                format
            )))
        }
    };

    stream
        .play()
        .map_err(|e| Error::DeviceUnavailable(format!("Failed to start stream: {}", e)))?;

    Ok((stream, config.sample_rate.0, name))
}

fn select_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let found = host
            .output_devices()
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to enumerate devices: {}", e)))?
            .find(|d| d.name().ok().as_deref() == Some(name));

        match found {
            Some(device) => {
                info!("Found requested audio device: {}", name);
                return Ok(device);
            }
            None => warn!(
                "Requested device '{}' not found, falling back to default device",
                name
            ),
        }
    }

    host.default_output_device()
        .ok_or_else(|| Error::DeviceUnavailable("No default output device found".to_string()))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    shared: Arc<Shared>,
    notices: NoticeSender,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let device_channels = config.channels as usize;
    let error_shared = Arc::clone(&shared);
    let error_notices = notices.clone();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render(data, device_channels, &shared, &notices);
            },
            move |err| {
                // Report once; the controller treats the device as gone for the session
                if !error_shared.device_failed.swap(true, Ordering::AcqRel) {
                    error!("Audio stream error: {}", err);
                    let _ = error_notices.send(EngineNotice::DeviceLost(err.to_string()));
                }
            },
            None,
        )
        .map_err(|e| Error::DeviceUnavailable(format!("Failed to build stream: {}", e)))
}

/// Audio callback body: copy the active source into `data`, apply gain,
/// advance the clock, and report natural completion.
fn render<T>(data: &mut [T], device_channels: usize, shared: &Shared, notices: &NoticeSender)
where
    T: SizedSample + FromSample<f32>,
{
    let frames = data.len() / device_channels.max(1);
    let mut ended = None;

    {
        let mut mixer = shared.lock_mixer();
        let gain = mixer.gain;

        for out_frame in data.chunks_mut(device_channels.max(1)) {
            let (mut left, mut right) = (0.0f32, 0.0f32);
            let mut finished = false;
            if let Some(source) = mixer.active.as_mut() {
                let base = source.cursor * source.channels;
                if base + 1 < source.samples.len() {
                    source.cursor += 1;
                    left = source.samples[base];
                    right = source.samples[base + 1];
                } else {
                    ended = Some(source.id);
                    finished = true;
                }
            }
            if finished {
                mixer.active = None;
            }

            let left = (left * gain).clamp(-1.0, 1.0);
            let right = (right * gain).clamp(-1.0, 1.0);
            match out_frame.len() {
                1 => out_frame[0] = T::from_sample((left + right) * 0.5),
                _ => {
                    for (ch, sample) in out_frame.iter_mut().enumerate() {
                        *sample = T::from_sample(match ch {
                            0 => left,
                            1 => right,
                            _ => 0.0,
                        });
                    }
                }
            }
        }
    }

    shared
        .frames_rendered
        .fetch_add(frames as u64, Ordering::AcqRel);

    if let Some(id) = ended {
        let _ = notices.send(EngineNotice::SourceEnded(id));
    }
}
