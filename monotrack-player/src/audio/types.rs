//! Core audio data types

use std::sync::Arc;

/// Number of interleaved channels in every decoded track
pub const TRACK_CHANNELS: u16 = 2;

/// A decoded track held entirely in RAM.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate matches the output device after resampling
///
/// Immutable once built. The sample data is behind an `Arc` so the audio
/// thread can read it while the controller keeps its own handle; a new load
/// replaces the whole `Track`, it is never edited in place.
#[derive(Debug, Clone)]
pub struct Track {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
    duration_seconds: f64,
}

impl Track {
    /// Build a track from interleaved samples.
    ///
    /// Returns `None` for an empty buffer or a zero rate/channel count, so a
    /// track with a non-positive duration can never be installed.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Option<Self> {
        if sample_rate == 0 || channels == 0 {
            return None;
        }
        let frames = samples.len() / channels as usize;
        if frames == 0 {
            return None;
        }

        Some(Self {
            samples: samples.into(),
            sample_rate,
            channels,
            duration_seconds: frames as f64 / sample_rate as f64,
        })
    }

    /// Interleaved sample data
    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Total duration in seconds (always > 0)
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Frame index for a position in seconds, clamped to the track
    pub fn frame_at(&self, seconds: f64) -> usize {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        let frame = (seconds * self.sample_rate as f64).round() as usize;
        frame.min(self.frame_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_frames() {
        // 1.5 seconds of stereo at 1 kHz
        let track = Track::new(vec![0.0; 3000], 1000, 2).unwrap();
        assert_eq!(track.frame_count(), 1500);
        assert!((track.duration_seconds() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(Track::new(Vec::new(), 44100, 2).is_none());
        assert!(Track::new(vec![0.0], 44100, 2).is_none());
        assert!(Track::new(vec![0.0; 4], 0, 2).is_none());
    }

    #[test]
    fn test_frame_at_clamps() {
        let track = Track::new(vec![0.0; 2000], 1000, 2).unwrap();
        assert_eq!(track.frame_at(-1.0), 0);
        assert_eq!(track.frame_at(0.25), 250);
        assert_eq!(track.frame_at(99.0), 1000);
        assert_eq!(track.frame_at(f64::NAN), 0);
    }
}
