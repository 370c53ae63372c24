//! Open-Meteo API response models

use serde::Deserialize;

/// Top-level forecast response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub hourly: Option<HourlyData>,
}

/// Hourly forecast arrays, index-aligned with `time`
///
/// Optional metrics arrive as nullable arrays; a missing array means the
/// metric was not requested or is unavailable for the location.
#[derive(Debug, Deserialize)]
pub struct HourlyData {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub wind_speed_10m: Vec<f64>,
    pub cloud_cover: Vec<f64>,
    pub weather_code: Vec<u16>,
    #[serde(default)]
    pub precipitation_probability: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub wind_gusts_10m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub cape: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub lifted_index: Option<Vec<Option<f64>>>,
}

impl HourlyData {
    /// Value of an optional metric at one index
    pub fn optional_at(slot: Option<&Vec<Option<f64>>>, index: usize) -> Option<f64> {
        slot.and_then(|values| values.get(index).copied().flatten())
    }
}

/// WMO weather codes signalling thunderstorms (95, 96, 99)
pub const fn is_thunderstorm_code(code: u16) -> bool {
    matches!(code, 95 | 96 | 99)
}
