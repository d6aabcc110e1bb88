//! Integration tests for the control API
//!
//! Drives the full router with `tower::ServiceExt::oneshot`, using a stream
//! connector that connects instantly and never delivers audio.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::Router;
use futures::StreamExt;
use http::Request;
use http_body_util::BodyExt;
use netradio_common::api::WifiState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use netradio_ctl::api::{create_router, AppContext};
use netradio_ctl::audio::DiscardOutput;
use netradio_ctl::error::StreamError;
use netradio_ctl::icons::IconStore;
use netradio_ctl::playback::{EngineConfig, PlaybackEngine};
use netradio_ctl::provisioning::{ProvisioningController, UnconfiguredJoiner};
use netradio_ctl::stations::{Station, StationDirectory};
use netradio_ctl::stream::{StreamConnector, StreamTransport};

struct SilentConnector;

#[async_trait]
impl StreamConnector for SilentConnector {
    async fn connect(&self, _url: &str) -> Result<StreamTransport, StreamError> {
        Ok(StreamTransport {
            metaint: None,
            station_name: None,
            content_type: Some("audio/mpeg".to_string()),
            body: futures::stream::pending().boxed(),
        })
    }
}

struct TestApp {
    router: Router,
    engine: Arc<PlaybackEngine>,
    _icons: TempDir,
}

fn station(name: &str, url: &str, icon: &str) -> Station {
    Station {
        name: name.to_string(),
        stream_url: url.to_string(),
        icon_ref: icon.to_string(),
    }
}

/// Directory order deliberately differs from alphabetical order
fn setup_with(write_default_icon: bool) -> TestApp {
    let icons = TempDir::new().unwrap();
    std::fs::write(icons.path().join("zeta.png"), b"zeta-icon").unwrap();
    if write_default_icon {
        std::fs::write(icons.path().join("default.png"), b"default-icon").unwrap();
    }

    let directory = Arc::new(StationDirectory::new([
        station("Zeta FM", "http://zeta.example/live", "zeta.png"),
        station("Alpha Radio", "http://alpha.example/live", ""),
    ]));

    let provisioning = ProvisioningController::new(Arc::new(UnconfiguredJoiner), WifiState::Joined);
    let engine = PlaybackEngine::new(
        directory,
        Arc::new(SilentConnector),
        Arc::new(DiscardOutput),
        provisioning.network_ready(),
        EngineConfig::default(),
    );
    engine.start_event_loop().unwrap();

    let router = create_router(AppContext {
        engine: Arc::clone(&engine),
        provisioning,
        icons: Arc::new(IconStore::new(icons.path(), "default.png")),
    });

    TestApp {
        router,
        engine,
        _icons: icons,
    }
}

fn setup() -> TestApp {
    setup_with(true)
}

/// Issue a GET and return status, content type and raw body
async fn get_raw(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get_raw(app, uri).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

// ============================================================================
// Health / station list
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = setup();
    let (status, body) = get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "netradio-ctl");
}

#[tokio::test]
async fn test_sender_lists_stations_in_directory_order() {
    let app = setup();
    let (status, _, body) = get_raw(&app.router, "/sender").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    let zeta = text.find("Zeta FM").unwrap();
    let alpha = text.find("Alpha Radio").unwrap();
    assert!(zeta < alpha, "order lost: {}", text);

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"Zeta FM": "zeta.png", "Alpha Radio": ""}));
}

// ============================================================================
// Playback control
// ============================================================================

#[tokio::test]
async fn test_initial_queries() {
    let app = setup();
    let (_, station) = get_json(&app.router, "/getCurrentRadioStation").await;
    let (_, info) = get_json(&app.router, "/getCurrentInfo").await;
    let (_, playing) = get_json(&app.router, "/getPlayingStatus").await;

    assert_eq!(station, json!({"station": ""}));
    assert_eq!(info, json!({"info": ""}));
    assert_eq!(playing, json!({"isPlaying": false}));
}

#[tokio::test]
async fn test_select_station_and_query() {
    let app = setup();

    // The control panel encodes spaces as '+'
    let (status, _, body) = get_raw(&app.router, "/setRadioStation?s=Zeta+FM").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (_, station) = get_json(&app.router, "/getCurrentRadioStation").await;
    let (_, playing) = get_json(&app.router, "/getPlayingStatus").await;
    assert_eq!(station["station"], "Zeta FM");
    assert_eq!(playing["isPlaying"], true);
}

#[tokio::test]
async fn test_select_unknown_station_is_404() {
    let app = setup();
    get_raw(&app.router, "/setRadioStation?s=Zeta%20FM").await;

    let (status, body) = get_json(&app.router, "/setRadioStation?s=zeta%20fm").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["status"].as_str().unwrap().starts_with("error"));

    // Previous selection untouched
    let (_, station) = get_json(&app.router, "/getCurrentRadioStation").await;
    assert_eq!(station["station"], "Zeta FM");
    assert!(app.engine.is_playing().await);
}

#[tokio::test]
async fn test_select_station_without_parameter_is_400() {
    let app = setup();
    let (status, _, _) = get_raw(&app.router, "/setRadioStation").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pause_resume_without_station_is_409() {
    let app = setup();
    let (status, body) = get_json(&app.router, "/pauseResume").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["status"].as_str().unwrap().starts_with("error"));
}

#[tokio::test]
async fn test_pause_resume_toggles() {
    let app = setup();
    get_raw(&app.router, "/setRadioStation?s=Alpha%20Radio").await;

    let (status, _, _) = get_raw(&app.router, "/pauseResume").await;
    assert_eq!(status, StatusCode::OK);
    let (_, playing) = get_json(&app.router, "/getPlayingStatus").await;
    assert_eq!(playing["isPlaying"], false);

    // Station stays selected while paused
    let (_, station) = get_json(&app.router, "/getCurrentRadioStation").await;
    assert_eq!(station["station"], "Alpha Radio");

    get_raw(&app.router, "/pauseResume").await;
    let (_, playing) = get_json(&app.router, "/getPlayingStatus").await;
    assert_eq!(playing["isPlaying"], true);
}

// ============================================================================
// Provisioning
// ============================================================================

#[tokio::test]
async fn test_connect_rejects_empty_ssid() {
    let app = setup();
    let (status, _, _) = get_raw(&app.router, "/connect?ssid=&password=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_connect_reports_failure_through_status() {
    let app = setup();

    let (status, _, _) = get_raw(&app.router, "/connect?ssid=HomeNet&password=secret").await;
    assert_eq!(status, StatusCode::OK);

    // No join facility is configured, so the attempt fails in the background
    let mut last = Value::Null;
    for _ in 0..50 {
        let (_, body) = get_json(&app.router, "/getConnectionStatus").await;
        if body["state"] == "joinFailed" {
            last = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(last["state"], "joinFailed");
    assert_eq!(last["ssid"], "HomeNet");
    assert!(last["error"].is_string());
    assert!(!last.to_string().contains("secret"));
}

// ============================================================================
// Icons
// ============================================================================

#[tokio::test]
async fn test_station_icon() {
    let app = setup();
    let (status, content_type, body) = get_raw(&app.router, "/zetafm").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(body, b"zeta-icon");
}

#[tokio::test]
async fn test_unknown_icon_falls_back_to_default() {
    let app = setup();
    for uri in ["/alpharadio", "/nosuchstation", "/default"] {
        let (status, _, body) = get_raw(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, b"default-icon", "{}", uri);
    }
}

#[tokio::test]
async fn test_icon_404_without_default() {
    let app = setup_with(false);
    let (status, _, _) = get_raw(&app.router, "/nosuchstation").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
