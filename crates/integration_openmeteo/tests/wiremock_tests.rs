//! Integration tests for the Open-Meteo client using wiremock
//!
//! These tests verify the client's behavior against a mock HTTP server,
//! ensuring proper handling of various response scenarios.

use domain::GeoLocation;
use integration_openmeteo::{OpenMeteoClient, OpenMeteoConfig, OpenMeteoError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Sample Open-Meteo hourly response for testing
fn sample_forecast_response() -> serde_json::Value {
    serde_json::json!({
        "latitude": 42.5,
        "longitude": 8.85,
        "generationtime_ms": 0.123,
        "utc_offset_seconds": 7200,
        "timezone": "Europe/Paris",
        "timezone_abbreviation": "CEST",
        "elevation": 275.0,
        "hourly_units": {
            "time": "iso8601",
            "temperature_2m": "°C",
            "precipitation": "mm",
            "precipitation_probability": "%",
            "weather_code": "wmo code",
            "cloud_cover": "%",
            "wind_speed_10m": "km/h",
            "wind_gusts_10m": "km/h",
            "cape": "J/kg",
            "lifted_index": "K"
        },
        "hourly": {
            "time": ["2026-07-14T06:00", "2026-07-14T07:00", "2026-07-14T08:00"],
            "temperature_2m": [16.2, 18.0, 20.5],
            "precipitation": [0.0, 0.3, 2.8],
            "precipitation_probability": [5, 30, 70],
            "weather_code": [1, 61, 95],
            "cloud_cover": [20.0, 60.0, 95.0],
            "wind_speed_10m": [8.0, 12.0, 22.0],
            "wind_gusts_10m": [15.0, 28.0, 48.0],
            "cape": [150.0, 600.0, 1800.0],
            "lifted_index": [3.0, 0.5, -4.0]
        }
    })
}

fn client_for(server: &MockServer) -> OpenMeteoClient {
    let config = OpenMeteoConfig {
        base_url: format!("{}/v1", server.uri()),
        ..OpenMeteoConfig::default()
    };
    OpenMeteoClient::new(config).expect("client creation should succeed")
}

fn calenzana() -> GeoLocation {
    GeoLocation::calenzana()
}

#[tokio::test]
async fn fetch_forecast_maps_hourly_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response()))
        .mount(&server)
        .await;

    let data = client_for(&server)
        .fetch_forecast(&calenzana())
        .await
        .expect("fetch should succeed");

    assert_eq!(data.source, "open-meteo");
    assert_eq!(data.points.len(), 3);

    let storm = &data.points[2];
    assert!((storm.temperature - 20.5).abs() < f64::EPSILON);
    assert!((storm.precipitation - 2.8).abs() < f64::EPSILON);
    assert_eq!(storm.rain_probability, Some(70.0));
    // WMO code 95 marks the sample as thunderstorm
    assert_eq!(storm.thunderstorm_probability, Some(70.0));
    assert_eq!(storm.lifted_index, Some(-4.0));

    // Codes 1 and 61 are not thunderstorm codes
    assert!(data.points[0].thunderstorm_probability.is_none());
    assert!(data.points[1].thunderstorm_probability.is_none());
}

#[tokio::test]
async fn rate_limit_is_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_forecast(&calenzana()).await;
    assert!(matches!(result, Err(OpenMeteoError::RateLimitExceeded)));
}

#[tokio::test]
async fn server_error_is_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_forecast(&calenzana()).await;
    assert!(matches!(result, Err(OpenMeteoError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn client_error_is_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_forecast(&calenzana()).await;
    assert!(matches!(result, Err(OpenMeteoError::RequestFailed(_))));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_forecast(&calenzana()).await;
    assert!(matches!(result, Err(OpenMeteoError::ParseError(_))));
}

#[tokio::test]
async fn missing_hourly_block_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"latitude": 42.5, "longitude": 8.85})),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_forecast(&calenzana()).await;
    assert!(matches!(result, Err(OpenMeteoError::ParseError(_))));
}
