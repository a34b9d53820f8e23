//! # Monotrack Player Library (monotrack-player)
//!
//! Single-track playback controller: load one encoded resource, decode it
//! into RAM and drive it with play/pause/seek/mute while reporting a
//! monotonic position derived from the audio hardware clock.
//!
//! **Architecture:** symphonia (decode) + rubato (resample) + cpal (output),
//! driven by a single-owner controller task and exposed over HTTP/SSE.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use playback::{PlayerHandle, PlayerService};
