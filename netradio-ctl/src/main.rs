//! Internet radio controller (netradio-ctl) - Main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use netradio_common::api::WifiState;
use netradio_common::config::{Overrides, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netradio_ctl::api::{self, AppContext};
use netradio_ctl::audio::{AudioOutput, CommandOutput, DiscardOutput};
use netradio_ctl::icons::IconStore;
use netradio_ctl::playback::{EngineConfig, PlaybackEngine};
use netradio_ctl::provisioning::{
    CommandJoiner, ProvisioningController, UnconfiguredJoiner, WifiJoiner,
};
use netradio_ctl::stations::StationDirectory;
use netradio_ctl::stream::HttpConnector;

/// Command-line arguments for netradio-ctl
#[derive(Parser, Debug)]
#[command(name = "netradio-ctl")]
#[command(about = "Internet radio playback controller")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NETRADIO_PORT")]
    port: Option<u16>,

    /// Configuration file
    #[arg(short, long, env = "NETRADIO_CONFIG")]
    config: Option<PathBuf>,

    /// Station list (TOML)
    #[arg(short, long, env = "NETRADIO_STATIONS")]
    stations: Option<PathBuf>,

    /// Directory holding station icons
    #[arg(short, long, env = "NETRADIO_ICONS")]
    icons: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config priority: CLI/env args > TOML file > defaults
    let mut config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(Overrides {
        port: args.port,
        stations_file: args.stations,
        icons_dir: args.icons,
    });

    // Initialize tracing; RUST_LOG wins over the config file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting netradio-ctl v{} ({}) on port {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        config.port
    );

    let directory = Arc::new(StationDirectory::load(&config.stations_file));

    // WiFi provisioning
    let joiner: Arc<dyn WifiJoiner> = match config.wifi.join_command.clone() {
        Some(argv) => Arc::new(CommandJoiner::new(argv, config.wifi.join_timeout())),
        None => {
            info!("No WiFi join command configured; /connect requests will fail");
            Arc::new(UnconfiguredJoiner)
        }
    };
    let initial = if config.wifi.assume_joined {
        WifiState::Joined
    } else {
        WifiState::Disconnected
    };
    let provisioning = ProvisioningController::new(joiner, initial);

    // Audio output
    let output: Arc<dyn AudioOutput> = match config.audio.command.clone() {
        Some(argv) => Arc::new(
            CommandOutput::new(argv).context("Failed to configure audio output command")?,
        ),
        None => {
            warn!("No audio output command configured; stream audio will be discarded");
            Arc::new(DiscardOutput)
        }
    };

    // Playback engine
    let connector =
        Arc::new(HttpConnector::new(&config.stream).context("Failed to build HTTP client")?);
    let engine = PlaybackEngine::new(
        directory,
        connector,
        output,
        provisioning.network_ready(),
        EngineConfig::from(&config.stream),
    );
    let _event_loop = engine
        .start_event_loop()
        .context("Failed to start session event loop")?;
    info!("Playback engine initialized");

    let ctx = AppContext {
        engine: Arc::clone(&engine),
        provisioning,
        icons: Arc::new(IconStore::new(
            config.icons_dir.clone(),
            config.default_icon.clone(),
        )),
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    engine.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
