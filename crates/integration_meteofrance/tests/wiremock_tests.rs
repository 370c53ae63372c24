//! Integration tests for the Météo-France clients using wiremock
//!
//! A mock token endpoint backs every test so the full authentication
//! path is exercised alongside the data endpoints.

use std::sync::Arc;

use domain::{AlertLevel, GeoLocation};
use integration_meteofrance::{
    AromeClient, AromeConfig, MeteoFranceClient, MeteoFranceConfig, MeteoFranceError,
    MeteoTokenProvider, TokenConfig,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_provider(server: &MockServer) -> Arc<MeteoTokenProvider> {
    let config = TokenConfig {
        token_url: format!("{}/token", server.uri()),
        ..TokenConfig::default()
    };
    Arc::new(
        MeteoTokenProvider::new(config, "id".to_string(), "secret".to_string().into())
            .expect("provider creation should succeed"),
    )
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn forecast_client(server: &MockServer) -> MeteoFranceClient {
    let config = MeteoFranceConfig {
        forecast_url: format!("{}/v2/forecast", server.uri()),
        vigilance_url: format!("{}/vigilance/public/bulletin", server.uri()),
        ..MeteoFranceConfig::default()
    };
    MeteoFranceClient::new(config, token_provider(server)).expect("client creation should succeed")
}

fn sample_forecast() -> serde_json::Value {
    serde_json::json!({
        "position": {"lat": 42.13, "lon": 9.13},
        "forecast": [
            {
                "dt": 1_784_005_200,
                "T": {"value": 19.5, "windchill": 18.0},
                "humidity": 70,
                "clouds": 30.0,
                "wind": {"speed": 3.0, "gust": 8.0, "direction": 225},
                "rain": {"1h": 0.0},
                "precipitation_probability": 10.0,
                "weather": {"icon": "p2j", "desc": "Eclaircies"}
            },
            {
                "dt": 1_784_008_800,
                "T": {"value": 22.0},
                "clouds": 90.0,
                "wind": {"speed": 8.0, "gust": 18.0},
                "rain": {"1h": 3.4},
                "precipitation_probability": 65.0,
                "weather": {"desc": "Orages"}
            }
        ]
    })
}

#[tokio::test]
async fn forecast_is_mapped_to_weather_samples() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/forecast"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
        .mount(&server)
        .await;

    let data = forecast_client(&server)
        .fetch_forecast(&GeoLocation::vizzavona())
        .await
        .expect("fetch should succeed");

    assert_eq!(data.source, "meteofrance");
    assert_eq!(data.points.len(), 2);

    let stormy = &data.points[1];
    assert!((stormy.temperature - 22.0).abs() < f64::EPSILON);
    // 8 m/s wind becomes 28.8 km/h
    assert!((stormy.wind_speed - 28.8).abs() < 1e-9);
    assert_eq!(stormy.thunderstorm_probability, Some(65.0));
    assert!(data.points[0].thunderstorm_probability.is_none());
}

#[tokio::test]
async fn empty_forecast_is_a_parse_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"forecast": []})))
        .mount(&server)
        .await;

    let result = forecast_client(&server)
        .fetch_forecast(&GeoLocation::vizzavona())
        .await;
    assert!(matches!(result, Err(MeteoFranceError::ParseError(_))));
}

#[tokio::test]
async fn forecast_rate_limit_is_reported() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/forecast"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = forecast_client(&server)
        .fetch_forecast(&GeoLocation::vizzavona())
        .await;
    assert!(matches!(result, Err(MeteoFranceError::RateLimitExceeded)));
}

#[tokio::test]
async fn vigilance_keeps_worst_color_per_phenomenon() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/vigilance/public/bulletin"))
        .and(query_param("domain", "2A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timelaps": [
                {
                    "max_colors": [
                        {"phenomenon_max_color_id": 2, "phenomenon_max_name": "Orages"},
                        {"phenomenon_max_color_id": 1, "phenomenon_max_name": "Vent"}
                    ]
                },
                {
                    "max_colors": [
                        {"phenomenon_max_color_id": 3, "phenomenon_max_name": "Orages"}
                    ]
                }
            ]
        })))
        .mount(&server)
        .await;

    let alerts = forecast_client(&server)
        .fetch_vigilance("2A")
        .await
        .expect("fetch should succeed");

    assert_eq!(alerts.len(), 2);
    let storm = alerts
        .iter()
        .find(|a| a.phenomenon == "thunderstorm")
        .expect("thunderstorm alert");
    assert_eq!(storm.level, AlertLevel::Orange);

    let wind = alerts.iter().find(|a| a.phenomenon == "wind").expect("wind alert");
    assert_eq!(wind.level, AlertLevel::Green);
}

#[tokio::test]
async fn arome_instability_extracts_extremes() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let coverage = |values: &str| {
        format!(
            r#"<?xml version="1.0"?><gml:RectifiedGridCoverage xmlns:gml="http://www.opengis.net/gml/3.2"><gml:rangeSet><gml:DataBlock><gml:tupleList>{values}</gml:tupleList></gml:DataBlock></gml:rangeSet></gml:RectifiedGridCoverage>"#
        )
    };

    Mock::given(method("GET"))
        .and(path("/wcs"))
        .and(query_param(
            "coverageId",
            "CONVECTIVE_AVAILABLE_POTENTIAL_ENERGY__GROUND_OR_WATER_SURFACE",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(coverage("150.0 900.0 1850.0")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wcs"))
        .and(query_param(
            "coverageId",
            "LIFTED_INDEX__GROUND_OR_WATER_SURFACE",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(coverage("2.0 -3.5 0.5")))
        .mount(&server)
        .await;

    let config = AromeConfig {
        base_url: format!("{}/wcs", server.uri()),
        ..AromeConfig::default()
    };
    let client =
        AromeClient::new(config, token_provider(&server)).expect("client creation should succeed");

    let sample = client
        .fetch_instability(&GeoLocation::vizzavona())
        .await
        .expect("fetch should succeed");

    assert_eq!(sample.cape, Some(1850.0));
    assert_eq!(sample.lifted_index, Some(-3.5));
}

#[tokio::test]
async fn arome_failure_degrades_to_empty_sample() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/wcs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = AromeConfig {
        base_url: format!("{}/wcs", server.uri()),
        ..AromeConfig::default()
    };
    let client =
        AromeClient::new(config, token_provider(&server)).expect("client creation should succeed");

    let sample = client
        .fetch_instability(&GeoLocation::vizzavona())
        .await
        .expect("degraded fetch should still succeed");
    assert!(sample.is_empty());
}
