//! Error types for netradio-ctl
//!
//! Every variant is recoverable: the engine keeps answering queries and
//! accepting commands after any of them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use netradio_common::api::StatusResponse;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Main error type for netradio-ctl
#[derive(Error, Debug)]
pub enum Error {
    /// Selection of a name the directory does not know
    #[error("Station not found: {0}")]
    StationNotFound(String),

    /// Pause/resume issued before any station was selected
    #[error("No station selected")]
    NoStationSelected,

    /// Join requested while a previous join is still running
    #[error("A WiFi join attempt is already in progress")]
    AlreadyJoining,

    /// Malformed client request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Stream connection or transfer failure
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Audio output collaborator failure
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration or station file errors
    #[error("Configuration error: {0}")]
    Config(#[from] netradio_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using netradio-ctl Error
pub type Result<T> = std::result::Result<T, Error>;

/// Whether a stream failure is worth a reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// Connection reset, timeout, server EOF, 5xx
    Transient,
    /// Bad URL, 4xx, audio output gone
    Fatal,
}

/// Stream failure reported by a session to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub message: String,
}

impl StreamError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: StreamErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: StreamErrorKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == StreamErrorKind::Transient
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StreamErrorKind::Transient => write!(f, "transient: {}", self.message),
            StreamErrorKind::Fatal => write!(f, "fatal: {}", self.message),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            return StreamError::fatal(format!("invalid request: {}", e));
        }
        match e.status() {
            Some(status) if status.is_client_error() => {
                StreamError::fatal(format!("HTTP {}", status))
            }
            _ => StreamError::transient(e.to_string()),
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::StationNotFound(_) => StatusCode::NOT_FOUND,
            Error::NoStationSelected | Error::AlreadyJoining => StatusCode::CONFLICT,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Stream(_)
            | Error::AudioOutput(_)
            | Error::Http(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (
            status,
            Json(StatusResponse {
                status: format!("error: {}", self),
            }),
        )
            .into_response()
    }
}
