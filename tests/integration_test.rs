//! End-to-end tests over real HTTP against an in-process stub backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use fieldwatch_dashboard::cache::{CacheKey, ClientCache};
use fieldwatch_dashboard::config::{Config, DEFAULT_WEATHER_API_URL};
use fieldwatch_dashboard::io::{HttpClient, ReqwestHttpClient};
use fieldwatch_dashboard::models::{Health, PumpStatus, SensorReading};
use fieldwatch_dashboard::pages::analytics::{to_csv, CSV_HEADER};
use fieldwatch_dashboard::pages::dashboard::stat_cards;
use fieldwatch_dashboard::pages::irrigation::Outcome;
use fieldwatch_dashboard::App;

// ---

#[derive(Clone)]
struct Stub {
    inner: Arc<Mutex<StubState>>,
}

struct StubState {
    failing: bool,
    config: Value,
    config_posts: usize,
}

impl Stub {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubState {
                failing: false,
                config: json!({"auto_mode": true, "moisture_threshold": 40.0, "manual_pump_state": false}),
                config_posts: 0,
            })),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    fn failing(&self) -> bool {
        self.inner.lock().unwrap().failing
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "backend down").into_response()
}

async fn sensors(State(stub): State<Stub>) -> Response {
    if stub.failing() {
        return unavailable();
    }
    Json(json!([
        {"id": "5f0c6a7e-1d2b-4c3a-9e8f-0a1b2c3d4e5f", "soil_moisture": 38.7, "temperature": 42.1,
         "humidity": 65, "pump_status": "OFF", "timestamp": "2025-03-26T18:45:00+00:00"},
        {"soil_moisture": 41.2, "temperature": 27.5, "humidity": 63.5,
         "pump_status": "ON", "timestamp": "2025-03-26T18:40:00+00:00"}
    ]))
    .into_response()
}

async fn alerts(State(stub): State<Stub>) -> Response {
    if stub.failing() {
        return unavailable();
    }
    Json(json!([
        {"id": 1, "type": "CRITICAL", "message": "Temperature critical", "timestamp": "2025-03-26T18:45:00Z", "read": false},
        {"id": 2, "type": "INFO", "message": "Irrigation cycle completed", "timestamp": "2025-03-26T17:00:00Z", "read": true}
    ]))
    .into_response()
}

async fn status(State(stub): State<Stub>) -> Response {
    if stub.failing() {
        return unavailable();
    }
    Json(json!({"database": "Online", "esp32": "Online", "api": "Online"})).into_response()
}

async fn get_config(State(stub): State<Stub>) -> Response {
    Json(stub.inner.lock().unwrap().config.clone()).into_response()
}

async fn post_config(State(stub): State<Stub>, Json(mut body): Json<Value>) -> Response {
    let mut state = stub.inner.lock().unwrap();
    if state.failing {
        return unavailable();
    }
    // The server stamps the record with a naive datetime, so the echo
    // differs from what was sent
    body["updated_at"] = json!("2025-03-26T19:00:00.123000");
    state.config = body.clone();
    state.config_posts += 1;
    Json(body).into_response()
}

async fn spawn_backend(stub: Stub) -> String {
    // ---
    let app = Router::new()
        .route("/api/sensors", get(sensors))
        .route("/api/alerts", get(alerts))
        .route("/api/status", get(status))
        .route("/api/config", get(get_config).post(post_config))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn test_config(base: &str, cache_dir: &std::path::Path) -> Config {
    // ---
    let secs = Duration::from_secs;
    Config {
        api_base_url: base.to_string(),
        weather_api_url: DEFAULT_WEATHER_API_URL.to_string(),
        location: None,
        cache_dir: cache_dir.to_path_buf(),
        sensor_poll: secs(1),
        alerts_poll: secs(1),
        status_poll: secs(1),
        analytics_poll: secs(1),
        weather_poll: secs(600),
        render_interval: secs(1),
        http_timeout: secs(5),
    }
}

fn http() -> Arc<dyn HttpClient> {
    Arc::new(ReqwestHttpClient::with_timeout(Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn dashboard_shows_latest_reading_over_http() -> Result<()> {
    // ---
    let base = spawn_backend(Stub::new()).await;
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&base, dir.path());
    let app = App::mount(&cfg, http(), ClientCache::on_disk(dir.path())?);

    assert!(app.stats.refresh().await);

    let cards = stat_cards(&app.stats.snapshot(), &app.thresholds);
    let values: Vec<_> = cards.iter().map(|c| c.value.clone()).collect();
    assert_eq!(values, ["38.7%", "42.1°C", "65.0%", "OFF"]);
    assert!(cards[1].flagged(), "42.1°C should be flagged");

    let screen = app.render(false);
    assert!(screen.contains("42.1°C [Critical]"));
    Ok(())
}

#[tokio::test]
async fn outage_keeps_last_good_snapshot_and_survives_restart() -> Result<()> {
    // ---
    let stub = Stub::new();
    let base = spawn_backend(stub.clone()).await;
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&base, dir.path());

    let cache = tokio_test::assert_ok!(ClientCache::on_disk(dir.path()));
    let app = App::mount(&cfg, http(), cache);
    assert!(app.sensors.refresh().await);
    assert!(app.health.refresh().await);
    let before = app.sensors.snapshot();
    assert_eq!(before.len(), 2);

    stub.set_failing(true);
    assert!(!app.sensors.refresh().await);
    assert!(!app.health.refresh().await);

    assert_eq!(app.sensors.snapshot(), before);
    assert_eq!(app.health.snapshot().api, Health::Offline);

    // A fresh mount against the dead backend still shows cached data
    let restarted = App::mount(&cfg, http(), ClientCache::on_disk(dir.path())?);
    assert_eq!(restarted.sensors.snapshot(), before);
    assert!(restarted.sensors.status().has_data);
    assert_eq!(restarted.health.snapshot().api, Health::Online);
    Ok(())
}

#[tokio::test]
async fn config_save_displays_server_echo() -> Result<()> {
    // ---
    let stub = Stub::new();
    let base = spawn_backend(stub.clone()).await;
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&base, dir.path());
    let app = App::mount(&cfg, http(), ClientCache::on_disk(dir.path())?);

    assert!(app.irrigation.load().await);
    assert!(app.irrigation.config().updated_at.is_none());

    // Auto mode is on, so the pump is locked
    assert_eq!(app.irrigation.set_pump(true).await, Outcome::Rejected);
    assert_eq!(stub.inner.lock().unwrap().config_posts, 0);

    assert_eq!(app.irrigation.set_auto_mode(false).await, Outcome::Saved);
    assert_eq!(app.irrigation.set_pump(true).await, Outcome::Saved);

    let shown = app.irrigation.config();
    assert!(!shown.auto_mode);
    assert!(shown.manual_pump_state);
    assert!(shown.updated_at.is_some(), "state must come from the echo");

    // Re-reading a record the backend stamped must still decode
    assert!(app.irrigation.load().await);
    assert_eq!(app.irrigation.config(), shown);

    // Handing control back to auto mode is allowed with the pump running
    assert_eq!(app.irrigation.set_auto_mode(true).await, Outcome::Saved);
    let shown = app.irrigation.config();
    assert!(shown.auto_mode);
    assert_eq!(stub.inner.lock().unwrap().config_posts, 3);

    stub.set_failing(true);
    assert_eq!(app.irrigation.update_threshold(55.0).await, Outcome::Failed);
    assert_eq!(app.irrigation.config(), shown);
    Ok(())
}

#[tokio::test]
async fn restart_without_backend_shows_cached_config() -> Result<()> {
    // ---
    let stub = Stub::new();
    let base = spawn_backend(stub.clone()).await;
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&base, dir.path());

    let app = App::mount(&cfg, http(), ClientCache::on_disk(dir.path())?);
    assert!(app.irrigation.load().await);
    assert_eq!(app.irrigation.set_auto_mode(false).await, Outcome::Saved);
    assert_eq!(app.irrigation.update_threshold(27.5).await, Outcome::Saved);
    let confirmed = app.irrigation.config();

    stub.set_failing(true);
    let restarted = App::mount(&cfg, http(), ClientCache::on_disk(dir.path())?);
    assert_eq!(restarted.irrigation.config(), confirmed);

    // GET /api/config stays up in the stub, so break the base URL instead
    let mut dead = cfg.clone();
    dead.api_base_url = "http://127.0.0.1:1".to_string();
    let offline = App::mount(&dead, http(), ClientCache::on_disk(dir.path())?);
    assert!(!offline.irrigation.load().await);
    assert_eq!(offline.irrigation.config().moisture_threshold_percent, 27.5);
    assert!(!offline.irrigation.config().auto_mode);
    Ok(())
}

#[tokio::test]
async fn polling_fills_every_page_then_stops() -> Result<()> {
    // ---
    let base = spawn_backend(Stub::new()).await;
    let dir = tempfile::tempdir()?;
    let cfg = test_config(&base, dir.path());
    let cache = ClientCache::on_disk(dir.path())?;
    let mut app = App::mount(&cfg, http(), cache.clone());

    app.start(&cfg);
    assert_eq!(app.running(), 7);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    app.stop().await;
    assert_eq!(app.running(), 0);

    assert!(app.stats.status().has_data);
    assert_eq!(app.recent_alerts.snapshot().len(), 2);
    assert_eq!(app.alerts.snapshot().len(), 2);

    // Analytics history is chronological: the older reading comes first
    let history: Vec<SensorReading> = cache.get(CacheKey::AnalyticsData).unwrap();
    assert_eq!(history[0].pump_status, PumpStatus::On);
    assert_eq!(history[1].soil_moisture_percent, 38.7);

    let csv = to_csv(&history);
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("2025-03-26T18:40:00Z,"));
    assert!(lines[2].starts_with("2025-03-26T18:45:00Z,"));

    // Weather has no location configured, so it never gets data
    assert!(!app.weather.status().has_data);
    Ok(())
}
