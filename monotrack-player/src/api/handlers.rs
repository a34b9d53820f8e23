//! HTTP request handlers
//!
//! Commands are fire-and-observe: a `202 Accepted` means the command was
//! queued, not that it changed anything. Clients read the outcome from
//! `/playback/state` or the event stream.

use crate::api::AppState;
use crate::playback::{PlayerCommand, PlayerSnapshot, Resource};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
    port: u16,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// 0-100; out-of-range values are clamped by the player
    percent: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0.0-1.0; 0 mutes
    volume: f32,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    /// URL, `file://` URL or local path
    resource: String,
}

/// Handler failure rendered as `{ "status": "error: ..." }`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        let body = Json(StatusResponse {
            status: format!("error: {}", message),
        });
        (code, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type ApiResult = Result<(StatusCode, Json<StatusResponse>), ApiError>;

async fn submit(state: &AppState, command: PlayerCommand) -> ApiResult {
    debug!("API command: {:?}", command);
    state.player.send(command).await.map_err(|e| {
        warn!("Command rejected: {}", e);
        ApiError::Unavailable(e.to_string())
    })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "accepted".to_string(),
        }),
    ))
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check with build identification
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "monotrack-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("MONOTRACK_GIT_HASH").to_string(),
        build_timestamp: env!("MONOTRACK_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("MONOTRACK_BUILD_PROFILE").to_string(),
        port: state.port,
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state - Latest snapshot
pub async fn get_state(State(state): State<AppState>) -> Json<PlayerSnapshot> {
    Json(state.player.snapshot())
}

pub async fn play(State(state): State<AppState>) -> ApiResult {
    submit(&state, PlayerCommand::Play).await
}

pub async fn pause(State(state): State<AppState>) -> ApiResult {
    submit(&state, PlayerCommand::Pause).await
}

pub async fn toggle(State(state): State<AppState>) -> ApiResult {
    submit(&state, PlayerCommand::Toggle).await
}

/// POST /playback/seek `{ "percent": 42.5 }`
pub async fn seek(
    State(state): State<AppState>,
    body: Result<Json<SeekRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    submit(
        &state,
        PlayerCommand::Seek {
            percent: request.percent,
        },
    )
    .await
}

/// POST /playback/load `{ "resource": "https://host/track.mp3" }`
pub async fn load(
    State(state): State<AppState>,
    body: Result<Json<LoadRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    if request.resource.trim().is_empty() {
        return Err(ApiError::BadRequest("resource must not be empty".to_string()));
    }
    submit(
        &state,
        PlayerCommand::Load {
            resource: Resource::parse(&request.resource),
        },
    )
    .await
}

// ============================================================================
// Output Level Endpoints
// ============================================================================

pub async fn mute(State(state): State<AppState>) -> ApiResult {
    submit(&state, PlayerCommand::Mute).await
}

pub async fn unmute(State(state): State<AppState>) -> ApiResult {
    submit(&state, PlayerCommand::Unmute).await
}

/// POST /playback/volume `{ "volume": 0.8 }`
pub async fn set_volume(
    State(state): State<AppState>,
    body: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    if !(0.0..=1.0).contains(&request.volume) {
        return Err(ApiError::BadRequest(format!(
            "volume must be 0.0-1.0, got {}",
            request.volume
        )));
    }
    submit(
        &state,
        PlayerCommand::SetVolume {
            level: request.volume,
        },
    )
    .await
}
