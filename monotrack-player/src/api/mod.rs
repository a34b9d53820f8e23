//! HTTP control surface
//!
//! Thin axum layer over a `PlayerHandle`: commands are queued and answered
//! with `202 Accepted`, state is read from the latest snapshot, and
//! `/events` streams every `PlayerEvent` as SSE.

pub mod handlers;
pub mod sse;

use crate::playback::PlayerHandle;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub player: PlayerHandle,
    /// Port the server listens on (reported by `/health`)
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Transport
        .route("/playback/state", get(handlers::get_state))
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/toggle", post(handlers::toggle))
        .route("/playback/seek", post(handlers::seek))
        .route("/playback/load", post(handlers::load))
        // Output level
        .route("/playback/mute", post(handlers::mute))
        .route("/playback/unmute", post(handlers::unmute))
        .route("/playback/volume", post(handlers::set_volume))
        // SSE event stream
        .route("/events", get(sse::event_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
