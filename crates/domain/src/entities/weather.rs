//! Weather forecast entities
//!
//! A `WeatherPoint` is one hourly forecast sample for one location.
//! Providers return a `WeatherData` series; analysis condenses one or more
//! series into a `WeatherAnalysis`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertLevel, GeoLocation, RiskKind, RiskLevel};

/// One hourly forecast sample
///
/// Core metrics are always present (providers report zero rather than
/// omitting them); convective metrics are optional because only some
/// providers and model runs carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    /// Location the sample applies to
    pub location: GeoLocation,
    /// Valid time of the sample
    pub time: DateTime<Utc>,
    /// Air temperature in °C
    pub temperature: f64,
    /// Precipitation amount in mm
    pub precipitation: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Cloud cover in percent
    pub cloud_cover: f64,
    /// Precipitation probability in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_probability: Option<f64>,
    /// Thunderstorm probability in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thunderstorm_probability: Option<f64>,
    /// Wind gusts in km/h
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_gusts: Option<f64>,
    /// Convective available potential energy in J/kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cape: Option<f64>,
    /// Lifted index in K (negative values mean unstable air)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifted_index: Option<f64>,
}

impl WeatherPoint {
    /// Create a sample with all core metrics zeroed
    #[must_use]
    pub const fn new(location: GeoLocation, time: DateTime<Utc>) -> Self {
        Self {
            location,
            time,
            temperature: 0.0,
            precipitation: 0.0,
            wind_speed: 0.0,
            cloud_cover: 0.0,
            rain_probability: None,
            thunderstorm_probability: None,
            wind_gusts: None,
            cape: None,
            lifted_index: None,
        }
    }
}

/// A forecast series from a single provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Provider label, e.g. "meteofrance" or "open-meteo"
    pub source: String,
    /// Samples in provider order
    pub points: Vec<WeatherPoint>,
}

impl WeatherData {
    #[must_use]
    pub fn new(source: impl Into<String>, points: Vec<WeatherPoint>) -> Self {
        Self {
            source: source.into(),
            points,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single detected hazard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRisk {
    pub kind: RiskKind,
    pub level: RiskLevel,
    /// The metric value that triggered the risk
    pub value: f64,
    /// The configured base threshold it exceeded
    pub threshold: f64,
    /// Valid time of the triggering sample
    pub time: DateTime<Utc>,
    pub description: String,
}

/// Maximum of one metric over the analysed window, with its valid time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricMax {
    pub value: f64,
    pub time: DateTime<Utc>,
}

impl MetricMax {
    /// Record `value` into `slot` if it exceeds the current maximum
    pub fn observe(slot: &mut Option<Self>, value: f64, time: DateTime<Utc>) {
        match slot {
            Some(current) if current.value >= value => {},
            _ => *slot = Some(Self { value, time }),
        }
    }

    /// Record `value` into `slot` if it undercuts the current minimum
    ///
    /// Used for the lifted index, where lower values mean more unstable air.
    pub fn observe_min(slot: &mut Option<Self>, value: f64, time: DateTime<Utc>) {
        match slot {
            Some(current) if current.value <= value => {},
            _ => *slot = Some(Self { value, time }),
        }
    }
}

/// Per-metric maxima over the analysed window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherMaxima {
    pub temperature: Option<MetricMax>,
    pub precipitation: Option<MetricMax>,
    pub rain_probability: Option<MetricMax>,
    pub wind_speed: Option<MetricMax>,
    pub wind_gusts: Option<MetricMax>,
    pub cloud_cover: Option<MetricMax>,
    pub thunderstorm_probability: Option<MetricMax>,
    pub cape: Option<MetricMax>,
    /// Minimum lifted index over the window (lower is worse)
    pub lifted_index: Option<MetricMax>,
}

/// Condensed result of analysing one or more forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAnalysis {
    /// All detected hazards, in detection order
    pub risks: Vec<WeatherRisk>,
    /// Per-metric maxima over the window
    pub maxima: WeatherMaxima,
    /// Aggregate weighted risk in [0, 1]
    pub risk: f64,
    /// Human-readable one-line summary
    pub summary: String,
}

impl WeatherAnalysis {
    /// The most severe detected risk, ties broken by triggering value
    #[must_use]
    pub fn highest_risk(&self) -> Option<&WeatherRisk> {
        self.risks.iter().max_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then(a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
        })
    }

    /// The most severe risk level, `None` when no risk triggered
    #[must_use]
    pub fn max_level(&self) -> Option<RiskLevel> {
        self.risks.iter().map(|r| r.level).max()
    }
}

/// A department-level vigilance warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VigilanceAlert {
    /// Phenomenon identifier as reported by the provider
    pub phenomenon: String,
    pub level: AlertLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
