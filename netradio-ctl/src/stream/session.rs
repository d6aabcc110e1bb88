//! Stream session lifecycle
//!
//! A session owns one outbound connection. Its worker task connects, feeds
//! audio to the output, extracts ICY titles and posts events to the engine.
//! It reports failures and exits; reconnect decisions belong to the engine.
//!
//! Cancellation: [`StreamSession::close`] signals the worker, which is
//! parked in a `select!` against every network await, and then joins it.
//! The transport is dropped inside the worker, so it is released before
//! `close` returns even when a read was in flight.

use crate::audio::AudioOutput;
use crate::error::StreamError;
use crate::playback::events::{SessionEvent, SessionEventKind, SessionId};
use crate::stream::connector::StreamConnector;
use crate::stream::metadata::IcyDemuxer;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started yet (retry backoff) or closed
    Idle,
    Connecting,
    Streaming,
    Failed,
}

/// Collaborators and limits shared by every session the engine opens
#[derive(Clone)]
pub struct SessionContext {
    pub connector: Arc<dyn StreamConnector>,
    pub output: Arc<dyn AudioOutput>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// Handle to a running session
pub struct StreamSession {
    id: SessionId,
    target_url: String,
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StreamSession {
    /// Spawn a session for `url`. `start_delay` postpones the connection
    /// attempt (retry backoff); the session can be closed during the delay.
    pub fn open(ctx: &SessionContext, url: &str, start_delay: Duration) -> Self {
        let id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = SessionWorker {
            id,
            url: url.to_string(),
            ctx: ctx.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(start_delay, shutdown_rx));

        debug!("Session {} opened for {}", id, url);
        Self {
            id,
            target_url: url.to_string(),
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Stop the worker and wait until it has released the transport.
    ///
    /// Safe in every state, including after the worker already failed.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!("Session {} worker panicked", self.id);
                }
            }
        }
        debug!("Session {} closed", self.id);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // Dropped without close(): do not leave the connection running
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct SessionWorker {
    id: SessionId,
    url: String,
    ctx: SessionContext,
    state: watch::Sender<ConnectionState>,
}

impl SessionWorker {
    async fn run(self, start_delay: Duration, mut shutdown: oneshot::Receiver<()>) {
        let failure = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            failure = self.stream(start_delay) => Some(failure),
        };

        match failure {
            None => {
                self.state.send_replace(ConnectionState::Idle);
                debug!("Session {} cancelled", self.id);
            }
            Some(error) => {
                self.state.send_replace(ConnectionState::Failed);
                warn!("Session {} for {} failed: {}", self.id, self.url, error);
                self.post(SessionEventKind::Failed(error));
            }
        }
    }

    /// Runs until the stream fails; only cancellation ends it otherwise
    async fn stream(&self, start_delay: Duration) -> StreamError {
        if !start_delay.is_zero() {
            tokio::time::sleep(start_delay).await;
        }

        self.state.send_replace(ConnectionState::Connecting);
        let connect = self.ctx.connector.connect(&self.url);
        let transport = match timeout(self.ctx.connect_timeout, connect).await {
            Err(_) => {
                return StreamError::transient(format!(
                    "connect timed out after {:?}",
                    self.ctx.connect_timeout
                ))
            }
            Ok(Err(e)) => return e,
            Ok(Ok(transport)) => transport,
        };

        let mut writer = match self.ctx.output.open(transport.content_type.as_deref()).await {
            Ok(writer) => writer,
            Err(e) => return StreamError::fatal(e.to_string()),
        };

        self.state.send_replace(ConnectionState::Streaming);
        info!(
            "Streaming {} ({})",
            self.url,
            transport.station_name.as_deref().unwrap_or("unnamed")
        );
        self.post(SessionEventKind::Connected);

        let mut demux = IcyDemuxer::new(transport.metaint);
        let mut body = transport.body;
        let mut last_title: Option<String> = None;

        loop {
            let chunk = match timeout(self.ctx.read_timeout, body.next()).await {
                Err(_) => {
                    return StreamError::transient(format!(
                        "no data for {:?}",
                        self.ctx.read_timeout
                    ))
                }
                Ok(None) => return StreamError::transient("server closed the stream"),
                Ok(Some(Err(e))) => return e,
                Ok(Some(Ok(chunk))) => chunk,
            };

            let demuxed = demux.feed(&chunk);
            if !demuxed.audio.is_empty() {
                if let Err(e) = writer.write(&demuxed.audio).await {
                    return StreamError::fatal(e.to_string());
                }
            }
            for title in demuxed.titles {
                if last_title.as_deref() != Some(title.as_str()) {
                    debug!("Session {} now playing: {}", self.id, title);
                    self.post(SessionEventKind::Metadata(title.clone()));
                    last_title = Some(title);
                }
            }
        }
    }

    fn post(&self, kind: SessionEventKind) {
        // Engine gone means shutdown; nothing left to notify
        let _ = self.ctx.events.send(SessionEvent::new(self.id, kind));
    }
}
