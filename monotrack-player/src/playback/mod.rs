//! Playback control
//!
//! - `anchor`: hardware clock to logical position mapping and end detection
//! - `graph`: the live source and gain stage on top of an `AudioEngine`
//! - `loader`: fetch and decode, tagged with load generations
//! - `reporter`: display-rate position ticker
//! - `controller`: the transport state machine tying these together
//! - `service`: the task that owns a controller, plus its cloneable handle

pub mod anchor;
pub mod controller;
pub mod graph;
pub mod loader;
pub mod reporter;
pub mod service;
pub mod state;

pub use anchor::{AnchorClock, EndDetection, EndRule};
pub use controller::{PlaybackController, Wakeup};
pub use graph::OutputGraph;
pub use loader::{Fetch, LoadOutcome, Resource, ResourceFetcher};
pub use reporter::Reporter;
pub use service::{PlayerHandle, PlayerService};
pub use state::{MuteState, PlayerCommand, PlayerSnapshot};
