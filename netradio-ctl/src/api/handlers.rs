//! HTTP request handlers
//!
//! All endpoints are GET with query parameters, matching what the browser
//! control panel sends. Commands answer with an empty 200 body; failures
//! use the status codes from [`crate::error::Error`].

use crate::api::server::AppContext;
use crate::error::Result;
use crate::stations::StationListing;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use netradio_common::api::{
    ConnectParams, ConnectionStatusResponse, CurrentInfoResponse, CurrentStationResponse,
    HealthResponse, PlayingStatusResponse, SetStationParams,
};
use tracing::{debug, info};

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "netradio-ctl".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
    })
}

// ============================================================================
// Station Endpoints
// ============================================================================

/// GET /sender - station name → icon reference, in directory order
pub async fn list_stations(State(ctx): State<AppContext>) -> Response {
    Json(StationListing(ctx.engine.directory())).into_response()
}

/// GET /setRadioStation?s=<name>
pub async fn set_radio_station(
    State(ctx): State<AppContext>,
    Query(params): Query<SetStationParams>,
) -> Result<StatusCode> {
    info!("Set station request: {:?}", params.s);
    ctx.engine.select_station(&params.s).await?;
    Ok(StatusCode::OK)
}

/// GET /<slug> - station icon, or the default icon on any miss
pub async fn station_icon(State(ctx): State<AppContext>, Path(slug): Path<String>) -> Response {
    match ctx.icons.resolve(ctx.engine.directory(), &slug).await {
        Some(icon) => (
            [
                (header::CONTENT_TYPE, icon.content_type),
                (header::CACHE_CONTROL, "max-age=3600"),
            ],
            icon.bytes,
        )
            .into_response(),
        None => {
            debug!("No icon for /{} and no default icon", slug);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /pauseResume
pub async fn pause_resume(State(ctx): State<AppContext>) -> Result<StatusCode> {
    let playing = ctx.engine.pause_resume().await?;
    info!("Pause/resume: now {}", if playing { "playing" } else { "paused" });
    Ok(StatusCode::OK)
}

/// GET /getCurrentRadioStation
pub async fn get_current_station(State(ctx): State<AppContext>) -> Json<CurrentStationResponse> {
    Json(CurrentStationResponse {
        station: ctx.engine.current_station().await.unwrap_or_default(),
    })
}

/// GET /getCurrentInfo
pub async fn get_current_info(State(ctx): State<AppContext>) -> Json<CurrentInfoResponse> {
    Json(CurrentInfoResponse {
        info: ctx.engine.current_info().await,
    })
}

/// GET /getPlayingStatus
pub async fn get_playing_status(State(ctx): State<AppContext>) -> Json<PlayingStatusResponse> {
    Json(PlayingStatusResponse {
        is_playing: ctx.engine.is_playing().await,
    })
}

// ============================================================================
// Provisioning Endpoints
// ============================================================================

/// GET /connect?ssid=<ssid>&password=<password> - starts a join attempt
pub async fn connect(
    State(ctx): State<AppContext>,
    Query(params): Query<ConnectParams>,
) -> Result<StatusCode> {
    // The join runs in the background; progress is read via /getConnectionStatus
    let _join = ctx.provisioning.connect(&params.ssid, &params.password)?;
    Ok(StatusCode::OK)
}

/// GET /getConnectionStatus
pub async fn get_connection_status(
    State(ctx): State<AppContext>,
) -> Json<ConnectionStatusResponse> {
    Json(ctx.provisioning.status().into())
}
