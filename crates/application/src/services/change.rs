//! Significant-change detection
//!
//! Compares the current condition maxima against the persisted snapshot
//! of the previous check. Only deteriorations count; an improvement never
//! triggers a warning.

use domain::WarningState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum deterioration per metric that counts as significant
///
/// Cloud cover is deliberately absent: it is tracked for reporting but a
/// change in cloud cover alone never justifies an unscheduled warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaThresholds {
    /// Thunderstorm probability in percentage points
    #[serde(default = "default_thunderstorm")]
    pub thunderstorm_probability: f64,
    /// Precipitation probability in percentage points
    #[serde(default = "default_precipitation")]
    pub precipitation: f64,
    /// Wind speed in km/h
    #[serde(default = "default_wind_speed")]
    pub wind_speed: f64,
    /// Temperature in °C
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

const fn default_thunderstorm() -> f64 {
    20.0
}

const fn default_precipitation() -> f64 {
    30.0
}

const fn default_wind_speed() -> f64 {
    10.0
}

const fn default_temperature() -> f64 {
    2.0
}

impl Default for DeltaThresholds {
    fn default() -> Self {
        Self {
            thunderstorm_probability: default_thunderstorm(),
            precipitation: default_precipitation(),
            wind_speed: default_wind_speed(),
            temperature: default_temperature(),
        }
    }
}

/// Whether conditions deteriorated enough since the previous snapshot
///
/// Without a previous snapshot every state is significant. Otherwise any
/// single metric whose increase reaches its delta threshold is enough.
#[must_use]
pub fn has_significant_change(
    current: &WarningState,
    previous: Option<&WarningState>,
    deltas: &DeltaThresholds,
) -> bool {
    let Some(previous) = previous else {
        debug!("no previous warning state, treating as significant");
        return true;
    };

    let checks = [
        (
            "thunderstorm_probability",
            current.max_thunderstorm_probability - previous.max_thunderstorm_probability,
            deltas.thunderstorm_probability,
        ),
        (
            "precipitation",
            current.max_precipitation - previous.max_precipitation,
            deltas.precipitation,
        ),
        (
            "wind_speed",
            current.max_wind_speed - previous.max_wind_speed,
            deltas.wind_speed,
        ),
        (
            "temperature",
            current.max_temperature - previous.max_temperature,
            deltas.temperature,
        ),
    ];

    for (metric, delta, threshold) in checks {
        if delta >= threshold {
            debug!(metric, delta, threshold, "significant deterioration");
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(thunder: f64, precip: f64, wind: f64, temp: f64, cloud: f64) -> WarningState {
        WarningState::snapshot(thunder, precip, wind, temp, cloud, None)
    }

    #[test]
    fn missing_previous_state_is_always_significant() {
        let current = state(0.0, 0.0, 0.0, 15.0, 10.0);
        assert!(has_significant_change(
            &current,
            None,
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn unchanged_conditions_are_not_significant() {
        let previous = state(30.0, 10.0, 20.0, 25.0, 50.0);
        let current = previous.clone();
        assert!(!has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn single_metric_crossing_its_delta_is_significant() {
        let previous = state(30.0, 10.0, 20.0, 25.0, 50.0);
        // Wind up by exactly 10 km/h, everything else unchanged
        let current = state(30.0, 10.0, 30.0, 25.0, 50.0);
        assert!(has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn change_just_below_delta_is_not_significant() {
        let previous = state(30.0, 10.0, 20.0, 25.0, 50.0);
        let current = state(49.9, 10.0, 20.0, 25.0, 50.0);
        assert!(!has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn temperature_delta_of_two_degrees_is_significant() {
        let previous = state(0.0, 0.0, 0.0, 28.0, 0.0);
        let current = state(0.0, 0.0, 0.0, 30.0, 0.0);
        assert!(has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn improvement_is_never_significant() {
        let previous = state(80.0, 40.0, 60.0, 35.0, 100.0);
        let current = state(10.0, 0.0, 5.0, 20.0, 0.0);
        assert!(!has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn cloud_cover_change_alone_is_ignored() {
        let previous = state(30.0, 10.0, 20.0, 25.0, 10.0);
        let current = state(30.0, 10.0, 20.0, 25.0, 100.0);
        assert!(!has_significant_change(
            &current,
            Some(&previous),
            &DeltaThresholds::default()
        ));
    }

    #[test]
    fn delta_defaults_match_documentation() {
        let deltas = DeltaThresholds::default();
        assert!((deltas.thunderstorm_probability - 20.0).abs() < f64::EPSILON);
        assert!((deltas.precipitation - 30.0).abs() < f64::EPSILON);
        assert!((deltas.wind_speed - 10.0).abs() < f64::EPSILON);
        assert!((deltas.temperature - 2.0).abs() < f64::EPSILON);
    }
}
