//! Playback state snapshot

use crate::playback::events::SessionId;

/// Engine state machine position, derived from [`PlaybackState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    NoStation,
    Playing,
    Paused,
}

/// What status queries observe.
///
/// The engine publishes a whole new value after each command or event, so a
/// reader never sees fields from two different transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_station: Option<String>,
    pub is_playing: bool,
    /// Last metadata text; empty until the current station sends some
    pub current_info: String,
    /// Live session, `Some` exactly when `is_playing`
    pub session_id: Option<SessionId>,
}

impl PlaybackState {
    pub fn status(&self) -> EngineStatus {
        match (&self.current_station, self.is_playing) {
            (None, _) => EngineStatus::NoStation,
            (Some(_), true) => EngineStatus::Playing,
            (Some(_), false) => EngineStatus::Paused,
        }
    }
}
