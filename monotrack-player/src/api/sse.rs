//! Server-Sent Events stream
//!
//! Every `PlayerEvent` published on the bus is forwarded as one SSE event
//! whose `event:` field is the event's type name.

use crate::api::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let stream = BroadcastStream::new(state.player.subscribe_events()).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default().event(event.event_type()).json_data(&event) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to serialize {} event: {}", event.event_type(), e);
                    None
                }
            },
            Err(e) => {
                // Lagged: the client missed events, later ones still flow
                warn!("SSE client fell behind: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
