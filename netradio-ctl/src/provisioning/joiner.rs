//! WiFi join facility seam
//!
//! Association itself is done by the platform (nmcli, wpa_cli, a vendor
//! tool). The controller only needs "did it work, and if not, why".

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Credentials for one join attempt. Never persisted; Debug hides the password.
#[derive(Clone)]
pub struct ProvisioningRequest {
    pub ssid: String,
    password: String,
}

impl ProvisioningRequest {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningRequest")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait WifiJoiner: Send + Sync {
    /// Join the network; `Err` carries a human-readable failure reason
    async fn join(&self, request: &ProvisioningRequest) -> Result<(), String>;
}

/// Runs a configured command, e.g.
/// `["nmcli", "dev", "wifi", "connect", "{ssid}", "password", "{password}"]`.
///
/// Exit status 0 means joined.
#[derive(Debug, Clone)]
pub struct CommandJoiner {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandJoiner {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }

    fn render(&self, request: &ProvisioningRequest) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{ssid}", &request.ssid)
                    .replace("{password}", request.password())
            })
            .collect()
    }
}

#[async_trait]
impl WifiJoiner for CommandJoiner {
    async fn join(&self, request: &ProvisioningRequest) -> Result<(), String> {
        let argv = self.render(request);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| "join command is empty".to_string())?;

        debug!("Running join command {} for {:?}", program, request.ssid);
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start {}: {}", program, e))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| format!("join timed out after {:?}", self.timeout))?
            .map_err(|e| format!("join command failed: {}", e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(format!("join command exited with {}", output.status))
        } else {
            Err(stderr)
        }
    }
}

/// Used when no join command is configured; every attempt fails
#[derive(Debug, Default)]
pub struct UnconfiguredJoiner;

#[async_trait]
impl WifiJoiner for UnconfiguredJoiner {
    async fn join(&self, _request: &ProvisioningRequest) -> Result<(), String> {
        Err("no WiFi join command configured".to_string())
    }
}
