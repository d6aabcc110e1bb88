//! Configuration loading and config file resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in defaults (fallback)
//!
//! CLI and environment handling live in the binary (clap); this module owns
//! the TOML layer, the defaults, and the override merge.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NETRADIO_CONFIG";

/// Default HTTP port (plain HTTP, the control panel is served from port 80
/// on the appliance but development hosts rarely allow binding it)
pub const DEFAULT_PORT: u16 = 8080;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// TOML file holding the station list
    pub stations_file: PathBuf,

    /// Directory holding station icons
    pub icons_dir: PathBuf,

    /// Icon served when a station has none (relative to `icons_dir`)
    pub default_icon: String,

    pub logging: LoggingConfig,
    pub stream: StreamConfig,
    pub audio: AudioConfig,
    pub wifi: WifiConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
}

/// Stream connection behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    pub connect_timeout_ms: u64,

    /// Maximum silence between two received chunks before the stream is
    /// considered stalled
    pub read_timeout_ms: u64,

    /// Reconnect attempts after a transient failure before playback stops
    pub max_retries: u32,

    /// Base delay before a reconnect attempt; doubles per consecutive attempt
    pub retry_backoff_ms: u64,

    /// Streaming time after which a failure no longer counts against the
    /// reconnect budget
    pub stable_after_ms: u64,

    pub user_agent: String,
}

/// Audio output collaborator
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Decoder command fed the raw stream over stdin, e.g. `["mpg123", "-q", "-"]`.
    /// Stream bytes are discarded when unset.
    pub command: Option<Vec<String>>,
}

/// WiFi join collaborator
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WifiConfig {
    /// Start in the joined state (wired hosts, pre-provisioned devices)
    pub assume_joined: bool,

    /// Join command; `{ssid}` and `{password}` are substituted per argument
    pub join_command: Option<Vec<String>>,

    pub join_timeout_ms: u64,
}

impl Default for TomlConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            port: DEFAULT_PORT,
            stations_file: data_dir.join("stations.toml"),
            icons_dir: data_dir.join("icons"),
            default_icon: "default.png".to_string(),
            logging: LoggingConfig::default(),
            stream: StreamConfig::default(),
            audio: AudioConfig::default(),
            wifi: WifiConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "netradio_ctl=info,tower_http=info".to_string(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            read_timeout_ms: 15_000,
            max_retries: 1,
            retry_backoff_ms: 2_000,
            stable_after_ms: 30_000,
            user_agent: concat!("netradio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            assume_joined: true,
            join_command: None,
            join_timeout_ms: 30_000,
        }
    }
}

impl StreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn stable_after(&self) -> Duration {
        Duration::from_millis(self.stable_after_ms)
    }
}

impl WifiConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub stations_file: Option<PathBuf>,
    pub icons_dir: Option<PathBuf>,
}

impl TomlConfig {
    /// Parse a config file. Unknown keys are ignored, missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file found by [`resolve_config_path`], falling back to
    /// defaults with a warning when none exists. A file that exists but does
    /// not parse is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                warn!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply CLI/environment values on top of the file values
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = overrides.stations_file {
            self.stations_file = path;
        }
        if let Some(path) = overrides.icons_dir {
            self.icons_dir = path;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_icon.trim().is_empty() {
            return Err(Error::Config("default_icon must not be empty".to_string()));
        }
        if let Some(command) = &self.audio.command {
            if command.is_empty() {
                return Err(Error::Config("audio.command must name a program".to_string()));
            }
        }
        if let Some(command) = &self.wifi.join_command {
            if command.is_empty() {
                return Err(Error::Config("wifi.join_command must name a program".to_string()));
            }
        }
        Ok(())
    }
}

/// Locate the config file.
///
/// Explicit path (CLI) wins, then `NETRADIO_CONFIG`, then the per-user file,
/// then the system-wide file. An explicit path is returned even if it does
/// not exist so the caller reports the mistake instead of silently using
/// defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("netradio").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/netradio/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// OS-dependent data directory for stations and icons
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("netradio"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/netradio"))
}
