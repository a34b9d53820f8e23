//! # Monotrack Common Library
//!
//! Shared code for the Monotrack player and any UI layer that binds to it:
//! - Event types (`PlayerEvent`, `PlaybackMode`, `PlayerFault`) and the `EventBus`
//! - Configuration file resolution
//! - Human-readable clock formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::{EventBus, PlaybackMode, PlayerEvent, PlayerFault};
