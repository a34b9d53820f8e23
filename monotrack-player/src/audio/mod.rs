//! Audio decoding and output
//!
//! Uses symphonia for decoding, rubato for resampling and cpal for output.

pub mod decoder;
pub mod engine;
pub mod output;
pub mod resampler;
pub mod types;

pub use decoder::SymphoniaDecoder;
pub use engine::{AudioEngine, EngineNotice, NoticeReceiver, NoticeSender, SourceId, TrackDecoder};
pub use output::CpalEngine;
pub use types::Track;
