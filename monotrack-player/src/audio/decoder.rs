//! Audio decoder using symphonia
//!
//! Decodes a complete in-memory encoded buffer (MP3, FLAC, AAC, Vorbis, WAV)
//! to interleaved stereo f32 at the output device's sample rate.

use crate::audio::engine::TrackDecoder;
use crate::audio::resampler::Resampler;
use crate::audio::types::{Track, TRACK_CHANNELS};
use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Whole-buffer decoder backed by symphonia's default codec registry.
#[derive(Debug, Clone)]
pub struct SymphoniaDecoder {
    /// Output rate; `None` keeps the source rate
    target_rate: Option<u32>,
}

impl SymphoniaDecoder {
    /// Decoder producing tracks at `target_rate` (the device rate)
    pub fn new(target_rate: u32) -> Self {
        Self {
            target_rate: Some(target_rate),
        }
    }

    /// Decoder that leaves audio at its native sample rate
    pub fn native_rate() -> Self {
        Self { target_rate: None }
    }

    /// Decode to interleaved f32 at the source rate.
    ///
    /// # Returns
    /// - `samples`: Interleaved stereo f32 samples
    /// - `sample_rate`: Original sample rate
    fn decode_native(bytes: Vec<u8>, hint_ext: Option<&str>) -> Result<(Vec<f32>, u32)> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = hint_ext {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;
        let mut decode_errors = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
                    });
                    if buf.capacity() < decoded.capacity() * channels {
                        *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    }
                    buf.copy_interleaved_ref(decoded);
                    Self::push_stereo(buf.samples(), channels, &mut samples);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet: skip it and keep going
                    decode_errors += 1;
                    warn!("Decode error (skipping packet): {}", e);
                }
                Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
            }
        }

        if decode_errors > 0 {
            warn!("Skipped {} undecodable packets", decode_errors);
        }

        debug!(
            "Decoded {} frames at {}Hz",
            samples.len() / TRACK_CHANNELS as usize,
            sample_rate
        );

        Ok((samples, sample_rate))
    }

    /// Append interleaved frames as stereo: mono is duplicated, extra
    /// channels beyond the first two are dropped.
    fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
        match channels {
            0 => {}
            1 => {
                for &sample in interleaved {
                    output.push(sample);
                    output.push(sample);
                }
            }
            2 => output.extend_from_slice(interleaved),
            n => {
                for frame in interleaved.chunks_exact(n) {
                    output.push(frame[0]);
                    output.push(frame[1]);
                }
            }
        }
    }
}

impl TrackDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>, hint: Option<&str>) -> Result<Track> {
        if bytes.is_empty() {
            return Err(Error::Decode("Empty input".to_string()));
        }

        let (samples, source_rate) = Self::decode_native(bytes, hint)?;

        let (samples, rate) = match self.target_rate {
            Some(target) => (
                Resampler::resample(samples, source_rate, target, TRACK_CHANNELS)?,
                target,
            ),
            None => (samples, source_rate),
        };

        Track::new(samples, rate, TRACK_CHANNELS)
            .ok_or_else(|| Error::Decode("Decoded audio contains no frames".to_string()))
    }
}
