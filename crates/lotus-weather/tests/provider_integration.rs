//! Integration tests for WeatherProvider using wiremock.
//!
//! These tests run the full fetch → persist → resolve cycle against a mock
//! station endpoint and a temporary snapshot directory.

use chrono::{NaiveDate, NaiveDateTime};
use lotus_weather::{FieldKey, FieldPolicy, SnapshotStore, WeatherError, WeatherProvider, WeatherView};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

/// Helper to build a station payload
fn station_payload(direct: &str, power: &str) -> serde_json::Value {
    serde_json::json!({
        "msg": "success",
        "code": 0,
        "data": {
            "real": {
                "station": { "code": "58457", "city": "杭州" },
                "publish_time": "2024-06-03 10:00",
                "weather": { "temperature": 27.3, "humidity": 65.0, "rain": 0.0, "feelst": 28.1 },
                "wind": { "direct": direct, "power": power },
                "warn": { "alert": "9999" }
            },
            "air": { "aqi": 51, "text": "良" },
            "tempchart": [
                { "time": "2024/06/02", "max_temp": 29, "min_temp": 21, "day_text": "晴", "night_text": "晴" },
                { "time": "2024/06/03", "max_temp": 30, "min_temp": 22, "day_text": "多云", "night_text": "小雨" },
                { "time": "2024/06/04", "max_temp": 28, "min_temp": 21, "day_text": "中雨", "night_text": "小雨" },
                { "time": "2024/06/05", "max_temp": 9999, "min_temp": 9999, "day_text": "9999", "night_text": "9999" }
            ]
        }
    })
}

async fn mount_station(server: &MockServer, station: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/weather"))
        .and(query_param("stationid", station))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_parses_and_persists_snapshot() {
    let server = MockServer::start().await;
    mount_station(&server, "58457", station_payload("东北风", "2级")).await;

    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("WeatherJson"));
    let provider = WeatherProvider::new(format!("{}/rest/weather", server.uri()), store).unwrap();

    let snapshot = provider.fetch_at("58457", at(10, 0)).await.unwrap();

    assert_eq!(snapshot.city.as_deref(), Some("杭州"));
    assert_eq!(snapshot.wind_direction.as_deref(), Some("东北风"));
    assert_eq!(snapshot.alert, None);
    assert_eq!(snapshot.forecast.len(), 4);

    let entries = provider.store().entries("58457").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fetched_at, at(10, 0));
    assert!(entries[0]
        .path
        .ends_with("WeatherJson/20240603-100000-58457.json"));
}

#[tokio::test]
async fn test_non_success_status_is_network_error_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = WeatherProvider::new(
        format!("{}/rest/weather", server.uri()),
        SnapshotStore::new(dir.path()),
    )
    .unwrap();

    let err = provider.fetch_at("58457", at(10, 0)).await.unwrap_err();
    assert!(matches!(err, WeatherError::Status(503)));
    assert!(err.is_network());
    assert!(provider.store().entries("58457").unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let dir = tempfile::tempdir().unwrap();
    // Port 9 (discard) on localhost is not expected to accept HTTP
    let provider = WeatherProvider::new(
        "http://127.0.0.1:9/rest/weather",
        SnapshotStore::new(dir.path()),
    )
    .unwrap();

    let err = provider.fetch_at("58457", at(10, 0)).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = WeatherProvider::new(
        format!("{}/rest/weather", server.uri()),
        SnapshotStore::new(dir.path()),
    )
    .unwrap();

    let err = provider.fetch_at("58457", at(10, 0)).await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
    assert!(provider.store().entries("58457").unwrap().is_empty());
}

#[tokio::test]
async fn test_sentinel_wind_resolved_from_earlier_fetch() {
    let server = MockServer::start().await;
    mount_station(&server, "58457", station_payload("东北风", "2级")).await;
    mount_station(&server, "58457", station_payload("9999", "9999")).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = WeatherProvider::new(
        format!("{}/rest/weather", server.uri()),
        SnapshotStore::new(dir.path()),
    )
    .unwrap();

    provider.fetch_at("58457", at(9, 30)).await.unwrap();
    let latest = provider.fetch_at("58457", at(10, 0)).await.unwrap();
    assert_eq!(latest.field(FieldKey::WindDirection), None);

    let today = at(10, 0).date();
    let view = WeatherView::build(&latest, provider.store(), &FieldPolicy::default(), today);

    assert_eq!(view.wind_direction.as_deref(), Some("东北风"));
    assert_eq!(view.wind_power.as_deref(), Some("2级"));
    assert_eq!(view.forecast.len(), 3);

    let lines = view.lines();
    assert_eq!(lines[0], "杭州 27.3°C Humidity: 65.0% Wind: 东北风 2级");
    assert_eq!(lines[2], "Today 30°C/22°C 多云/小雨");
    assert_eq!(lines[3], "Tue 28°C/21°C 中雨/小雨");
    assert_eq!(lines[4], "Wed Err°C/Err°C Err/Err");
}
