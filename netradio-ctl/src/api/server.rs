//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::icons::IconStore;
use crate::playback::PlaybackEngine;
use crate::provisioning::ProvisioningController;
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<PlaybackEngine>,
    pub provisioning: ProvisioningController,
    pub icons: Arc<IconStore>,
}

/// Build the router for all control endpoints
///
/// Fixed paths take priority over the `/:slug` icon catch-all; lowercase
/// ones must stay in sync with [`crate::icons::RESERVED_SLUGS`].
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))

        // Station directory
        .route("/sender", get(handlers::list_stations))
        .route("/setRadioStation", get(handlers::set_radio_station))

        // Playback control
        .route("/pauseResume", get(handlers::pause_resume))
        .route("/getCurrentRadioStation", get(handlers::get_current_station))
        .route("/getCurrentInfo", get(handlers::get_current_info))
        .route("/getPlayingStatus", get(handlers::get_playing_status))

        // WiFi provisioning
        .route("/connect", get(handlers::connect))
        .route("/getConnectionStatus", get(handlers::get_connection_status))

        // Station icons
        .route("/:slug", get(handlers::station_icon))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // The control panel may be served from another origin
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
