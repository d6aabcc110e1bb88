//! Playback control engine
//!
//! **Responsibilities:**
//! - Station selection and pause/resume
//! - Ownership of the single live [`StreamSession`] and its replacement
//! - Session event handling (metadata, failures, bounded reconnect)
//! - Publishing consistent [`PlaybackState`] snapshots for status queries
//!
//! **Serialization:** every command and every session event runs under one
//! `tokio::sync::Mutex`. Queries never take it; they read the snapshot that
//! the mutation holding the lock publishes when it finishes. Sessions do
//! their network I/O in their own task and only talk back through the event
//! channel, so no I/O happens under the lock except waiting for a cancelled
//! session to release its transport.

use crate::audio::AudioOutput;
use crate::error::{Error, Result};
use crate::playback::events::{SessionEvent, SessionEventKind, SessionId};
use crate::playback::state::{EngineStatus, PlaybackState};
use crate::stations::{Station, StationDirectory};
use crate::stream::connector::StreamConnector;
use crate::stream::session::{SessionContext, StreamSession};
use netradio_common::config::StreamConfig;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Upper bound for a single reconnect delay
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Reconnect policy for transient stream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Reconnects allowed before playback stops
    pub max_retries: u32,
    /// Delay before the first reconnect; doubles for each further attempt
    pub backoff: Duration,
    /// A session that streamed at least this long before failing starts a
    /// fresh budget; shorter ones keep counting
    pub stable_after: Duration,
}

impl RetryPolicy {
    /// Delay before reconnect number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(5);
        self.backoff.saturating_mul(1u32 << exp).min(MAX_BACKOFF)
    }
}

/// Engine tuning taken from the `[stream]` config section
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl From<&StreamConfig> for EngineConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: config.retry_backoff(),
                stable_after: config.stable_after(),
            },
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

/// Mutable state guarded by the engine lock
#[derive(Default)]
struct EngineInner {
    state: PlaybackState,
    station: Option<Station>,
    session: Option<StreamSession>,
    /// Reconnects spent since the last user action or stable session
    retries_used: u32,
    /// When the live session reported `Connected`
    connected_at: Option<Instant>,
}

impl EngineInner {
    fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            session_id: self.session.as_ref().map(StreamSession::id),
            ..self.state.clone()
        }
    }
}

/// Playback engine - the single owner of "what is playing"
pub struct PlaybackEngine {
    directory: Arc<StationDirectory>,

    /// Serialization point for commands and session events
    inner: Mutex<EngineInner>,

    /// Last published state, read by queries
    snapshot: RwLock<PlaybackState>,

    sessions: SessionContext,
    retry: RetryPolicy,

    /// Set by the provisioning controller; read-only here
    network_ready: watch::Receiver<bool>,

    /// Taken by the event loop on start
    event_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SessionEvent>>>,
}

impl PlaybackEngine {
    pub fn new(
        directory: Arc<StationDirectory>,
        connector: Arc<dyn StreamConnector>,
        output: Arc<dyn AudioOutput>,
        network_ready: watch::Receiver<bool>,
        config: EngineConfig,
    ) -> Arc<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sessions = SessionContext {
            connector,
            output,
            events: event_tx,
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
        };

        Arc::new(Self {
            directory,
            inner: Mutex::new(EngineInner::default()),
            snapshot: RwLock::new(PlaybackState::default()),
            sessions,
            retry: config.retry,
            network_ready,
            event_rx: std::sync::Mutex::new(Some(event_rx)),
        })
    }

    /// Spawn the task that feeds session events into the engine.
    ///
    /// Holds only a weak reference, so it ends once the engine is dropped.
    pub fn start_event_loop(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut rx = self
            .event_rx
            .lock()
            .map_err(|_| Error::Internal("event receiver lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| Error::Internal("event loop already started".to_string()))?;
        let engine: Weak<Self> = Arc::downgrade(self);

        Ok(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.handle_session_event(event).await;
            }
            debug!("Session event loop finished");
        }))
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Select a station and start playing it.
    ///
    /// Re-selecting the station that is already playing does nothing;
    /// re-selecting it while paused resumes it.
    pub async fn select_station(&self, name: &str) -> Result<()> {
        let station = self.directory.lookup(name)?.clone();

        let mut inner = self.inner.lock().await;
        let is_current = inner.state.current_station.as_deref() == Some(name);

        if is_current && inner.state.is_playing {
            debug!("{} is already playing", name);
            return Ok(());
        }

        if is_current {
            info!("Resuming {}", name);
        } else {
            info!("Switching to {}", name);
            inner.state.current_station = Some(station.name.clone());
            inner.state.current_info.clear();
            inner.station = Some(station.clone());
        }
        inner.retries_used = 0;
        self.start_session(&mut inner, &station.stream_url, Duration::ZERO)
            .await;

        self.publish(&inner).await;
        Ok(())
    }

    /// Toggle between playing and paused; returns the new playing flag
    pub async fn pause_resume(&self) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let url = inner
            .station
            .as_ref()
            .map(|s| s.stream_url.clone())
            .ok_or(Error::NoStationSelected)?;

        if inner.state.is_playing {
            self.stop_session(&mut inner).await;
            info!("Paused");
        } else {
            inner.retries_used = 0;
            self.start_session(&mut inner, &url, Duration::ZERO).await;
            info!("Resumed");
        }

        self.publish(&inner).await;
        Ok(inner.state.is_playing)
    }

    /// Close the live session; used on process shutdown
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.stop_session(&mut inner).await;
        self.publish(&inner).await;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn snapshot(&self) -> PlaybackState {
        self.snapshot.read().await.clone()
    }

    pub async fn current_station(&self) -> Option<String> {
        self.snapshot.read().await.current_station.clone()
    }

    pub async fn current_info(&self) -> String {
        self.snapshot.read().await.current_info.clone()
    }

    pub async fn is_playing(&self) -> bool {
        self.snapshot.read().await.is_playing
    }

    pub async fn status(&self) -> EngineStatus {
        self.snapshot.read().await.status()
    }

    pub async fn current_session_id(&self) -> Option<SessionId> {
        self.snapshot.read().await.session_id
    }

    // ========================================================================
    // Session events
    // ========================================================================

    /// Apply an event from a stream session.
    ///
    /// Events from any session other than the live one are discarded.
    pub async fn handle_session_event(&self, event: SessionEvent) {
        let mut inner = self.inner.lock().await;

        let live = inner.session.as_ref().map(StreamSession::id);
        if live != Some(event.session_id) {
            debug!("Discarding stale event from session {}", event.session_id);
            return;
        }

        match event.kind {
            SessionEventKind::Connected => {
                inner.connected_at = Some(Instant::now());
            }
            SessionEventKind::Metadata(text) => {
                if inner.state.current_info != text {
                    inner.state.current_info = text;
                    self.publish(&inner).await;
                }
            }
            SessionEventKind::Failed(err) => {
                let url = match inner.station.as_ref() {
                    Some(station) => station.stream_url.clone(),
                    None => {
                        error!("Live session without a selected station");
                        self.stop_session(&mut inner).await;
                        self.publish(&inner).await;
                        return;
                    }
                };

                // Only a session that streamed past `stable_after` refunds the budget
                if let Some(streamed) = inner.connected_at.map(|at| at.elapsed()) {
                    if streamed >= self.retry.stable_after {
                        debug!("Session streamed {:?}; reconnect budget restored", streamed);
                        inner.retries_used = 0;
                    }
                }

                if err.is_transient() && inner.retries_used < self.retry.max_retries {
                    inner.retries_used += 1;
                    let delay = self.retry.delay(inner.retries_used);
                    warn!(
                        "Stream interrupted ({}); reconnect {}/{} in {:?}",
                        err, inner.retries_used, self.retry.max_retries, delay
                    );
                    self.start_session(&mut inner, &url, delay).await;
                } else {
                    warn!("Playback stopped: {}", err);
                    self.stop_session(&mut inner).await;
                }
                self.publish(&inner).await;
            }
        }
    }

    // ========================================================================
    // Internals (lock held by caller)
    // ========================================================================

    /// Replace the live session with a new one for `url`.
    ///
    /// Without network the selection is kept but playback stays paused.
    async fn start_session(&self, inner: &mut EngineInner, url: &str, delay: Duration) {
        self.stop_session(inner).await;

        if !*self.network_ready.borrow() {
            warn!("Network not ready; not opening {}", url);
            return;
        }

        inner.session = Some(StreamSession::open(&self.sessions, url, delay));
        inner.state.is_playing = true;
    }

    async fn stop_session(&self, inner: &mut EngineInner) {
        if let Some(session) = inner.session.take() {
            session.close().await;
        }
        inner.connected_at = None;
        inner.state.is_playing = false;
    }

    async fn publish(&self, inner: &EngineInner) {
        *self.snapshot.write().await = inner.snapshot();
    }
}
