//! Open-Meteo forecast client
//!
//! HTTP client for the Open-Meteo Weather API. Maps the hourly arrays
//! into domain weather samples.

use chrono::{DateTime, TimeZone, Utc};
use domain::{GeoLocation, WeatherData, WeatherPoint};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::{ForecastResponse, HourlyData, is_thunderstorm_code};

/// Source label used on returned weather data
pub const SOURCE: &str = "open-meteo";

/// Open-Meteo client errors
#[derive(Debug, Error)]
pub enum OpenMeteoError {
    /// Connection to the weather service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the weather service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse response from weather service
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Open-Meteo service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoConfig {
    /// API base URL (default: <https://api.open-meteo.com/v1>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Number of forecast days (1-16, default: 3)
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_forecast_days() -> u8 {
    3
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            forecast_days: default_forecast_days(),
        }
    }
}

/// Open-Meteo HTTP client
#[derive(Debug)]
pub struct OpenMeteoClient {
    client: Client,
    config: OpenMeteoConfig,
}

impl OpenMeteoClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: OpenMeteoConfig) -> Result<Self, OpenMeteoError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OpenMeteoError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, OpenMeteoError> {
        Self::new(OpenMeteoConfig::default())
    }

    /// Fetch the hourly forecast for a location
    ///
    /// # Errors
    ///
    /// Fails on connection problems, non-success status codes and
    /// malformed responses.
    #[instrument(skip(self), fields(lat = %location.latitude(), lon = %location.longitude()))]
    pub async fn fetch_forecast(
        &self,
        location: &GeoLocation,
    ) -> Result<WeatherData, OpenMeteoError> {
        let url = self.build_forecast_url(location);
        debug!(url = %url, "Fetching hourly forecast");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OpenMeteoError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OpenMeteoError::RateLimitExceeded);
        }
        if status.is_server_error() {
            return Err(OpenMeteoError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(OpenMeteoError::RequestFailed(format!("HTTP {status}")));
        }

        let api_response: ForecastResponse = response
            .json()
            .await
            .map_err(|e| OpenMeteoError::ParseError(e.to_string()))?;

        let hourly = api_response
            .hourly
            .ok_or_else(|| OpenMeteoError::ParseError("No hourly data in response".to_string()))?;

        let points = map_hourly(location, &hourly)?;
        Ok(WeatherData::new(SOURCE, points))
    }

    fn build_forecast_url(&self, location: &GeoLocation) -> String {
        let days = self.config.forecast_days.clamp(1, 16);
        format!(
            "{}/forecast?latitude={}&longitude={}&hourly={}&timezone=auto&forecast_days={}",
            self.config.base_url,
            location.latitude(),
            location.longitude(),
            "temperature_2m,precipitation,precipitation_probability,weather_code,\
             cloud_cover,wind_speed_10m,wind_gusts_10m,cape,lifted_index",
            days
        )
    }
}

/// Map the index-aligned hourly arrays into weather samples
///
/// Rows whose core arrays are shorter than `time` are skipped with a
/// warning rather than failing the whole fetch.
fn map_hourly(
    location: &GeoLocation,
    hourly: &HourlyData,
) -> Result<Vec<WeatherPoint>, OpenMeteoError> {
    let mut points = Vec::with_capacity(hourly.time.len());

    for (i, raw_time) in hourly.time.iter().enumerate() {
        let time = parse_datetime(raw_time)?;

        let (Some(&temperature), Some(&precipitation), Some(&wind_speed), Some(&cloud_cover)) = (
            hourly.temperature_2m.get(i),
            hourly.precipitation.get(i),
            hourly.wind_speed_10m.get(i),
            hourly.cloud_cover.get(i),
        ) else {
            warn!(index = i, "hourly arrays out of alignment, skipping row");
            continue;
        };

        let precipitation_probability =
            HourlyData::optional_at(hourly.precipitation_probability.as_ref(), i);

        // Open-Meteo carries no thunderstorm probability; when the WMO
        // code says thunderstorm, the precipitation probability is the
        // best available stand-in.
        let thunderstorm_probability = hourly
            .weather_code
            .get(i)
            .copied()
            .filter(|&code| is_thunderstorm_code(code))
            .and(precipitation_probability);

        points.push(WeatherPoint {
            rain_probability: precipitation_probability,
            thunderstorm_probability,
            wind_gusts: HourlyData::optional_at(hourly.wind_gusts_10m.as_ref(), i),
            cape: HourlyData::optional_at(hourly.cape.as_ref(), i),
            lifted_index: HourlyData::optional_at(hourly.lifted_index.as_ref(), i),
            temperature,
            precipitation,
            wind_speed,
            cloud_cover,
            ..WeatherPoint::new(*location, time)
        });
    }

    Ok(points)
}

/// Parse an API timestamp to `DateTime<Utc>`
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, OpenMeteoError> {
    // Hourly timestamps come without seconds (2026-07-14T06:00)
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(Utc.from_utc_datetime(&dt));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&dt));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(OpenMeteoError::ParseError(format!(
        "Invalid datetime format: {s}"
    )))
}
