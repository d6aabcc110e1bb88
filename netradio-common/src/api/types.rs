//! Shared API request/response types
//!
//! Field names follow the JSON the browser control panel reads
//! (`station`, `info`, `isPlaying`), so renames here break the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ========================================
// Query Parameters
// ========================================

/// Query parameters for `GET /setRadioStation?s=<name>`
///
/// The client encodes spaces as `+`; form decoding restores them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetStationParams {
    pub s: String,
}

/// Query parameters for `GET /connect?ssid=<ssid>&password=<password>`
#[derive(Clone, Deserialize, Serialize)]
pub struct ConnectParams {
    pub ssid: String,

    /// Empty for open networks
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ========================================
// Playback Responses
// ========================================

/// `GET /getCurrentRadioStation`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentStationResponse {
    /// Empty string until a station has been selected
    pub station: String,
}

/// `GET /getCurrentInfo`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentInfoResponse {
    pub info: String,
}

/// `GET /getPlayingStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingStatusResponse {
    pub is_playing: bool,
}

// ========================================
// Provisioning Responses
// ========================================

/// WiFi join workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WifiState {
    Disconnected,
    Joining,
    Joined,
    JoinFailed,
}

impl fmt::Display for WifiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WifiState::Disconnected => "disconnected",
            WifiState::Joining => "joining",
            WifiState::Joined => "joined",
            WifiState::JoinFailed => "joinFailed",
        };
        f.write_str(s)
    }
}

/// `GET /getConnectionStatus`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub state: WifiState,

    /// SSID of the last join attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,

    /// Failure reason reported by the WiFi facility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the state last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ========================================
// Generic Responses
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
}
