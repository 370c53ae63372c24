//! Météo-France forecast and vigilance client

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{AlertLevel, GeoLocation, VigilanceAlert, WeatherData, WeatherPoint};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{
    ForecastEntry, ForecastResponse, VigilanceResponse, WeatherDescription, canonical_phenomenon,
};
use crate::token::{MeteoTokenProvider, TokenError};

/// Source label used on returned weather data
pub const SOURCE: &str = "meteofrance";

/// Météo-France client errors
#[derive(Debug, Error)]
pub enum MeteoFranceError {
    /// Token acquisition failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] TokenError),

    /// Request to the API failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse an API response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Météo-France service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteoFranceConfig {
    /// Forecast API base URL
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Vigilance bulletin URL
    #[serde(default = "default_vigilance_url")]
    pub vigilance_url: String,

    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_forecast_url() -> String {
    "https://webservice.meteofrance.com/v2/forecast".to_string()
}

fn default_vigilance_url() -> String {
    "https://portail-api.meteofrance.fr/vigilance/public/bulletin".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for MeteoFranceConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            vigilance_url: default_vigilance_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Authenticated Météo-France HTTP client
#[derive(Debug)]
pub struct MeteoFranceClient {
    client: Client,
    config: MeteoFranceConfig,
    tokens: Arc<MeteoTokenProvider>,
}

impl MeteoFranceClient {
    /// Create a new client sharing an existing token provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        config: MeteoFranceConfig,
        tokens: Arc<MeteoTokenProvider>,
    ) -> Result<Self, MeteoFranceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MeteoFranceError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Fetch the hourly forecast for a location
    ///
    /// # Errors
    ///
    /// Fails on authentication problems, connection problems, non-success
    /// status codes and malformed responses.
    #[instrument(skip(self), fields(lat = %location.latitude(), lon = %location.longitude()))]
    pub async fn fetch_forecast(
        &self,
        location: &GeoLocation,
    ) -> Result<WeatherData, MeteoFranceError> {
        let url = format!(
            "{}?lat={}&lon={}",
            self.config.forecast_url,
            location.latitude(),
            location.longitude()
        );
        debug!(url = %url, "Fetching hourly forecast");

        let response: ForecastResponse = self.get_json(&url).await?;
        if response.forecast.is_empty() {
            return Err(MeteoFranceError::ParseError(
                "No forecast entries in response".to_string(),
            ));
        }

        let mut points = Vec::with_capacity(response.forecast.len());
        for entry in &response.forecast {
            points.push(map_entry(location, entry)?);
        }
        Ok(WeatherData::new(SOURCE, points))
    }

    /// Fetch the active vigilance alerts for a department
    ///
    /// Returns one alert per phenomenon with its maximum colour over the
    /// bulletin periods.
    ///
    /// # Errors
    ///
    /// Fails on authentication problems, connection problems, non-success
    /// status codes and malformed responses.
    #[instrument(skip(self))]
    pub async fn fetch_vigilance(
        &self,
        department: &str,
    ) -> Result<Vec<VigilanceAlert>, MeteoFranceError> {
        let url = format!("{}?domain={department}", self.config.vigilance_url);
        debug!(url = %url, "Fetching vigilance bulletin");

        let response: VigilanceResponse = self.get_json(&url).await?;

        let mut alerts: Vec<VigilanceAlert> = Vec::new();
        for timelap in &response.timelaps {
            for color in &timelap.max_colors {
                let Some(level) = alert_level(color.phenomenon_max_color_id) else {
                    continue;
                };
                let phenomenon = color
                    .phenomenon_max_name
                    .as_deref()
                    .map_or_else(|| "unknown".to_string(), canonical_phenomenon);

                // Keep the worst colour per phenomenon across periods
                if let Some(existing) = alerts.iter_mut().find(|a| a.phenomenon == phenomenon) {
                    if level.priority() > existing.level.priority() {
                        existing.level = level;
                    }
                } else {
                    alerts.push(VigilanceAlert {
                        phenomenon,
                        level,
                        description: None,
                    });
                }
            }
        }
        Ok(alerts)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, MeteoFranceError> {
        let token = self.tokens.get_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| MeteoFranceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Token may have been revoked server-side
            self.tokens.invalidate();
        }
        check_status(status)?;

        response
            .json()
            .await
            .map_err(|e| MeteoFranceError::ParseError(e.to_string()))
    }
}

/// Map one forecast entry onto a domain weather sample
///
/// Wind speeds arrive in m/s and are converted to km/h. The thunderstorm
/// probability mirrors the precipitation probability when the textual
/// description announces a thunderstorm.
fn map_entry(location: &GeoLocation, entry: &ForecastEntry) -> Result<WeatherPoint, MeteoFranceError> {
    let time = DateTime::<Utc>::from_timestamp(entry.dt, 0).ok_or_else(|| {
        MeteoFranceError::ParseError(format!("Invalid timestamp: {}", entry.dt))
    })?;

    let to_kmh = |ms: f64| ms * 3.6;
    let thunderstorm = entry
        .weather
        .as_ref()
        .is_some_and(WeatherDescription::is_thunderstorm);

    Ok(WeatherPoint {
        temperature: entry.temperature.value,
        precipitation: entry.rain.as_ref().and_then(|r| r.one_hour).unwrap_or(0.0),
        wind_speed: entry
            .wind
            .as_ref()
            .and_then(|w| w.speed)
            .map_or(0.0, to_kmh),
        cloud_cover: entry.clouds.unwrap_or(0.0),
        rain_probability: entry.precipitation_probability,
        thunderstorm_probability: entry
            .precipitation_probability
            .filter(|_| thunderstorm),
        wind_gusts: entry.wind.as_ref().and_then(|w| w.gust).map(to_kmh),
        ..WeatherPoint::new(*location, time)
    })
}

/// Map a response status onto the client error variants
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), MeteoFranceError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(MeteoFranceError::RateLimitExceeded);
    }
    if status.is_server_error() {
        return Err(MeteoFranceError::ServiceUnavailable(format!(
            "HTTP {status}"
        )));
    }
    if !status.is_success() {
        return Err(MeteoFranceError::RequestFailed(format!("HTTP {status}")));
    }
    Ok(())
}

const fn alert_level(color_id: u8) -> Option<AlertLevel> {
    match color_id {
        1 => Some(AlertLevel::Green),
        2 => Some(AlertLevel::Yellow),
        3 => Some(AlertLevel::Orange),
        4 => Some(AlertLevel::Red),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = MeteoFranceConfig::default();
        assert!(config.forecast_url.contains("meteofrance.com"));
        assert!(config.vigilance_url.contains("vigilance"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn color_ids_map_to_alert_levels() {
        assert_eq!(alert_level(1), Some(AlertLevel::Green));
        assert_eq!(alert_level(2), Some(AlertLevel::Yellow));
        assert_eq!(alert_level(3), Some(AlertLevel::Orange));
        assert_eq!(alert_level(4), Some(AlertLevel::Red));
        assert_eq!(alert_level(0), None);
        assert_eq!(alert_level(9), None);
    }

    #[test]
    fn entry_with_thunderstorm_description_carries_probability() {
        let json = serde_json::json!({
            "dt": 1_752_471_000,
            "T": {"value": 24.5},
            "clouds": 85.0,
            "wind": {"speed": 5.0, "gust": 12.0},
            "rain": {"1h": 1.2},
            "precipitation_probability": 60.0,
            "weather": {"desc": "Orages violents"}
        });
        let entry: ForecastEntry = serde_json::from_value(json).unwrap();

        let point = map_entry(&GeoLocation::vizzavona(), &entry).unwrap();
        assert_eq!(point.thunderstorm_probability, Some(60.0));
        assert_eq!(point.rain_probability, Some(60.0));
        assert!((point.wind_speed - 18.0).abs() < f64::EPSILON);
        assert!((point.wind_gusts.unwrap() - 43.2).abs() < 1e-9);
        assert!((point.precipitation - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_without_thunderstorm_has_no_thunder_probability() {
        let json = serde_json::json!({
            "dt": 1_752_471_000,
            "T": {"value": 18.0},
            "precipitation_probability": 40.0,
            "weather": {"desc": "Pluie faible"}
        });
        let entry: ForecastEntry = serde_json::from_value(json).unwrap();

        let point = map_entry(&GeoLocation::vizzavona(), &entry).unwrap();
        assert!(point.thunderstorm_probability.is_none());
        assert_eq!(point.rain_probability, Some(40.0));
        assert!((point.precipitation - 0.0).abs() < f64::EPSILON);
    }
}
