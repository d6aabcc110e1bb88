//! HTTP payload types shared between the control backend and its tests
//!
//! Pure serde types only; the axum wiring lives in `netradio-ctl`.

pub mod types;

pub use types::{
    ConnectParams, ConnectionStatusResponse, CurrentInfoResponse, CurrentStationResponse,
    HealthResponse, PlayingStatusResponse, SetStationParams, StatusResponse, WifiState,
};
