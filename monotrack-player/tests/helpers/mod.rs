//! Test helper modules for monotrack-player integration tests
//!
//! - `fake_engine`: an `AudioEngine` with a hand-advanced clock and a source ledger
//! - `fakes`: decoder and fetcher doubles, plus a controller harness
//! - `audio_generator`: hound-written WAV files for real decode tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_engine;
pub mod fakes;

pub use audio_generator::{generate_silent_wav, generate_sine_wav};
pub use fake_engine::{fake_engine, EngineProbe, FakeEngine};
pub use fakes::{drain_events, failing_resource, seconds, Harness, SecondsDecoder, SlowFetch};
