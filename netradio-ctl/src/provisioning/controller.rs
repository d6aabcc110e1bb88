//! WiFi provisioning state machine
//!
//! `Disconnected | JoinFailed | Joined --connect--> Joining --outcome--> Joined | JoinFailed`
//!
//! A request while `Joining` is rejected with `AlreadyJoining`. The
//! controller owns the network-ready flag; the playback engine holds a
//! read-only receiver.

use crate::error::{Error, Result};
use crate::provisioning::joiner::{ProvisioningRequest, WifiJoiner};
use chrono::{DateTime, Utc};
use netradio_common::api::{ConnectionStatusResponse, WifiState};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Longest SSID allowed by 802.11
const MAX_SSID_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningStatus {
    pub state: WifiState,
    pub ssid: Option<String>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProvisioningStatus> for ConnectionStatusResponse {
    fn from(status: ProvisioningStatus) -> Self {
        Self {
            state: status.state,
            ssid: status.ssid,
            error: status.error,
            updated_at: status.updated_at,
        }
    }
}

struct Shared {
    status: Mutex<ProvisioningStatus>,
    joiner: Arc<dyn WifiJoiner>,
    ready: watch::Sender<bool>,
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, ProvisioningStatus> {
        // Never held across an await; a poisoned lock still holds valid data
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone)]
pub struct ProvisioningController {
    shared: Arc<Shared>,
}

impl ProvisioningController {
    /// `initial` is `Joined` on hosts that are already online and
    /// `Disconnected` on a device waiting for credentials.
    pub fn new(joiner: Arc<dyn WifiJoiner>, initial: WifiState) -> Self {
        let (ready, _) = watch::channel(initial == WifiState::Joined);
        Self {
            shared: Arc::new(Shared {
                status: Mutex::new(ProvisioningStatus {
                    state: initial,
                    ssid: None,
                    error: None,
                    updated_at: None,
                }),
                joiner,
                ready,
            }),
        }
    }

    /// Read-only view of the network-ready flag
    pub fn network_ready(&self) -> watch::Receiver<bool> {
        self.shared.ready.subscribe()
    }

    pub fn status(&self) -> ProvisioningStatus {
        self.shared.status().clone()
    }

    /// Begin a join attempt and return immediately.
    ///
    /// The returned handle completes once the outcome is recorded.
    pub fn connect(&self, ssid: &str, password: &str) -> Result<JoinHandle<()>> {
        let ssid = ssid.trim();
        if ssid.is_empty() {
            return Err(Error::BadRequest("ssid must not be empty".to_string()));
        }
        if ssid.len() > MAX_SSID_BYTES {
            return Err(Error::BadRequest(format!(
                "ssid longer than {} bytes",
                MAX_SSID_BYTES
            )));
        }

        {
            let mut status = self.shared.status();
            if status.state == WifiState::Joining {
                return Err(Error::AlreadyJoining);
            }
            *status = ProvisioningStatus {
                state: WifiState::Joining,
                ssid: Some(ssid.to_string()),
                error: None,
                updated_at: Some(Utc::now()),
            };
        }
        self.shared.ready.send_replace(false);
        info!("Joining WiFi network {:?}", ssid);

        let request = ProvisioningRequest::new(ssid, password);
        let shared = Arc::clone(&self.shared);
        Ok(tokio::spawn(async move {
            let outcome = shared.joiner.join(&request).await;

            let mut status = shared.status();
            status.updated_at = Some(Utc::now());
            match outcome {
                Ok(()) => {
                    info!("Joined WiFi network {:?}", request.ssid);
                    status.state = WifiState::Joined;
                    status.error = None;
                    shared.ready.send_replace(true);
                }
                Err(reason) => {
                    warn!("Joining {:?} failed: {}", request.ssid, reason);
                    status.state = WifiState::JoinFailed;
                    status.error = Some(reason);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::joiner::UnconfiguredJoiner;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Blocks until released, then succeeds
    struct GatedJoiner {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl WifiJoiner for GatedJoiner {
        async fn join(&self, _request: &ProvisioningRequest) -> std::result::Result<(), String> {
            self.gate.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_successful_join_sets_ready() {
        let gate = Arc::new(Notify::new());
        let controller = ProvisioningController::new(
            Arc::new(GatedJoiner { gate: gate.clone() }),
            WifiState::Disconnected,
        );
        let ready = controller.network_ready();
        assert!(!*ready.borrow());

        let handle = controller.connect("HomeNet", "password1").unwrap();
        assert_eq!(controller.status().state, WifiState::Joining);
        assert!(matches!(
            controller.connect("Other", "x"),
            Err(Error::AlreadyJoining)
        ));

        gate.notify_one();
        handle.await.unwrap();

        let status = controller.status();
        assert_eq!(status.state, WifiState::Joined);
        assert_eq!(status.ssid.as_deref(), Some("HomeNet"));
        assert!(status.updated_at.is_some());
        assert!(*ready.borrow());
    }

    #[tokio::test]
    async fn test_failed_join_is_recorded_and_retryable() {
        let controller =
            ProvisioningController::new(Arc::new(UnconfiguredJoiner), WifiState::Disconnected);

        controller.connect("HomeNet", "pw").unwrap().await.unwrap();

        let status = controller.status();
        assert_eq!(status.state, WifiState::JoinFailed);
        assert!(status.error.is_some());
        assert!(!*controller.network_ready().borrow());

        // A new attempt is accepted from JoinFailed
        controller.connect("HomeNet", "pw2").unwrap().await.unwrap();
        assert_eq!(controller.status().state, WifiState::JoinFailed);
    }

    #[tokio::test]
    async fn test_rejoin_drops_readiness_while_joining() {
        let gate = Arc::new(Notify::new());
        let controller = ProvisioningController::new(
            Arc::new(GatedJoiner { gate: gate.clone() }),
            WifiState::Joined,
        );
        let ready = controller.network_ready();
        assert!(*ready.borrow());

        let handle = controller.connect("NewNet", "pw").unwrap();
        assert!(!*ready.borrow());

        gate.notify_one();
        handle.await.unwrap();
        assert!(*ready.borrow());
    }

    #[test]
    fn test_invalid_ssid_rejected() {
        let controller =
            ProvisioningController::new(Arc::new(UnconfiguredJoiner), WifiState::Disconnected);
        assert!(matches!(
            controller.connect("   ", "pw"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            controller.connect(&"x".repeat(33), "pw"),
            Err(Error::BadRequest(_))
        ));
        assert_eq!(controller.status().state, WifiState::Disconnected);
    }

    #[test]
    fn test_status_into_response() {
        let response: ConnectionStatusResponse = ProvisioningStatus {
            state: WifiState::Joined,
            ssid: Some("HomeNet".to_string()),
            error: None,
            updated_at: None,
        }
        .into();
        assert_eq!(response.state, WifiState::Joined);
        assert_eq!(response.ssid.as_deref(), Some("HomeNet"));
    }
}
