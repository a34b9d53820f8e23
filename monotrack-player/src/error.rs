//! Error types for monotrack-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Transport commands never return these: inapplicable commands are silent
//! no-ops and load/device failures are reported through the observable state.

use thiserror::Error;

/// Main error type for monotrack-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource fetch errors (network, missing file)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Audio decoding errors (unsupported or corrupt encoding)
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Output device or stream could not be created
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Errors from an already-open output device
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not valid for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<monotrack_common::Error> for Error {
    fn from(err: monotrack_common::Error) -> Self {
        match err {
            monotrack_common::Error::Io(e) => Error::Io(e),
            monotrack_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}

/// Convenience Result type using monotrack-player Error
pub type Result<T> = std::result::Result<T, Error>;
