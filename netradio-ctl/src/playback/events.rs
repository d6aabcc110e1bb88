//! Internal session events (stream session → engine)
//!
//! Sessions post these over an unbounded channel so they never wait on the
//! engine's lock. The engine drops any event whose `session_id` is not the
//! live session.

use crate::error::StreamError;
use uuid::Uuid;

/// Identity of one stream session; a retry or switch always gets a new one
pub type SessionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub kind: SessionEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    /// Transport established and audio output opened
    Connected,

    /// New "now playing" text, only sent when it differs from the previous one
    Metadata(String),

    /// The session has stopped; it posts nothing after this
    Failed(StreamError),
}

impl SessionEvent {
    pub fn new(session_id: SessionId, kind: SessionEventKind) -> Self {
        Self { session_id, kind }
    }
}
