//! WAV file generation for decode tests
//!
//! Deterministic 16-bit PCM files with a known frame count, so decoded
//! durations can be checked exactly.

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Generate a silent WAV file
pub fn generate_silent_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_samples = sample_rate as u64 * duration_ms / 1000 * channels as u64;
    for _ in 0..total_samples {
        writer.write_sample(0i16)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a sine wave WAV file with the same signal on every channel
///
/// `amplitude` is 0.0-1.0 (0.5 avoids clipping after resampling).
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = sample_rate as u64 * duration_ms / 1000;
    let peak = amplitude * i16::MAX as f32;

    for frame in 0..total_frames {
        let t = frame as f32 / sample_rate as f32;
        let sample = ((2.0 * PI * frequency_hz * t).sin() * peak) as i16;
        for _ in 0..channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}
