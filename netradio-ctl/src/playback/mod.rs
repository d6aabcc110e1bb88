//! Playback control: engine, state snapshot and session events

pub mod engine;
pub mod events;
pub mod state;

pub use engine::{EngineConfig, PlaybackEngine, RetryPolicy};
pub use events::{SessionEvent, SessionEventKind, SessionId};
pub use state::{EngineStatus, PlaybackState};
