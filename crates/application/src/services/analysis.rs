//! Weather risk analysis
//!
//! Condenses one or more hourly forecast series into detected risks, a
//! per-metric maximum table and a weighted scalar risk score. Multiple
//! provider series are first merged on the worst-case principle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domain::{
    MetricMax, RiskKind, RiskLevel, WeatherAnalysis, WeatherData, WeatherMaxima, WeatherPoint,
    WeatherRisk,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Severity tier tables, checked with `>=` (base thresholds use strict `>`)
const RAIN_PROBABILITY_TIERS: [f64; 3] = [25.0, 50.0, 75.0];
const PRECIPITATION_TIERS: [f64; 3] = [2.0, 5.0, 10.0];
const THUNDERSTORM_TIERS: [f64; 3] = [20.0, 40.0, 60.0];
const WIND_TIERS: [f64; 3] = [40.0, 60.0, 80.0];
const CLOUD_TIERS: [f64; 3] = [90.0, 95.0, 98.0];
const TEMPERATURE_TIERS: [f64; 3] = [30.0, 35.0, 40.0];

/// Base thresholds above which a metric counts as a risk
///
/// Values are strict lower bounds: a sample exactly at the threshold does
/// not trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Precipitation probability in percent
    #[serde(default = "default_rain_probability")]
    pub rain_probability: f64,
    /// Precipitation amount in mm
    #[serde(default = "default_rain_amount")]
    pub rain_amount: f64,
    /// Thunderstorm probability in percent
    #[serde(default = "default_thunderstorm_probability")]
    pub thunderstorm_probability: f64,
    /// Wind speed in km/h
    #[serde(default = "default_wind_speed")]
    pub wind_speed: f64,
    /// Air temperature in °C
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Cloud cover in percent
    #[serde(default = "default_cloud_cover")]
    pub cloud_cover: f64,
}

const fn default_rain_probability() -> f64 {
    25.0
}

const fn default_rain_amount() -> f64 {
    2.0
}

const fn default_thunderstorm_probability() -> f64 {
    20.0
}

const fn default_wind_speed() -> f64 {
    20.0
}

const fn default_temperature() -> f64 {
    32.0
}

const fn default_cloud_cover() -> f64 {
    90.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rain_probability: default_rain_probability(),
            rain_amount: default_rain_amount(),
            thunderstorm_probability: default_thunderstorm_probability(),
            wind_speed: default_wind_speed(),
            temperature: default_temperature(),
            cloud_cover: default_cloud_cover(),
        }
    }
}

/// One entry of the weighted risk model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameter {
    /// Threshold the metric has to cross for its weight to count
    pub threshold: Option<f64>,
    /// Contribution to the aggregate risk when the threshold is crossed
    #[serde(default)]
    pub weight: f64,
}

/// Weighted risk model keyed by metric name
pub type RiskModel = BTreeMap<String, RiskParameter>;

/// Merge several forecast series into one worst-case series
///
/// Samples are grouped by exact timestamp. Per timestamp the incumbent
/// sample is replaced when the candidate is strictly higher in any of
/// precipitation, thunderstorm probability, wind speed, cloud cover or
/// temperature; on a full tie the earlier source wins. The output is
/// sorted by timestamp.
pub fn merge_weather_sources(sources: &[WeatherData]) -> WeatherData {
    if sources.is_empty() {
        return WeatherData::new("merged", Vec::new());
    }
    if sources.len() == 1 {
        return sources[0].clone();
    }

    let mut by_time: BTreeMap<DateTime<Utc>, WeatherPoint> = BTreeMap::new();
    for source in sources {
        for point in &source.points {
            match by_time.get(&point.time) {
                Some(incumbent) if !outranks(point, incumbent) => {},
                _ => {
                    by_time.insert(point.time, point.clone());
                },
            }
        }
    }

    let label = sources
        .iter()
        .map(|s| s.source.as_str())
        .collect::<Vec<_>>()
        .join("+");
    WeatherData::new(label, by_time.into_values().collect())
}

/// Whether `candidate` is more dangerous than `incumbent`
///
/// A strictly higher value in any compared metric is enough; missing
/// thunderstorm probabilities compare as zero.
fn outranks(candidate: &WeatherPoint, incumbent: &WeatherPoint) -> bool {
    candidate.precipitation > incumbent.precipitation
        || candidate.thunderstorm_probability.unwrap_or(0.0)
            > incumbent.thunderstorm_probability.unwrap_or(0.0)
        || candidate.wind_speed > incumbent.wind_speed
        || candidate.cloud_cover > incumbent.cloud_cover
        || candidate.temperature > incumbent.temperature
}

/// Analyse forecast series against the configured thresholds
///
/// Missing optional metrics are skipped, never treated as an error. The
/// aggregate risk score is zero when no risk model is configured.
pub fn analyze_weather(
    sources: &[WeatherData],
    thresholds: &Thresholds,
    risk_model: Option<&RiskModel>,
) -> WeatherAnalysis {
    let merged = merge_weather_sources(sources);
    if merged.is_empty() {
        warn!("no weather data points available");
        return WeatherAnalysis {
            risks: Vec::new(),
            maxima: WeatherMaxima::default(),
            risk: 0.0,
            summary: "Keine Wetterdaten verfügbar.".to_string(),
        };
    }

    let mut risks = Vec::new();
    let mut maxima = WeatherMaxima::default();

    for point in &merged.points {
        MetricMax::observe(&mut maxima.temperature, point.temperature, point.time);
        MetricMax::observe(&mut maxima.precipitation, point.precipitation, point.time);
        MetricMax::observe(&mut maxima.wind_speed, point.wind_speed, point.time);
        MetricMax::observe(&mut maxima.cloud_cover, point.cloud_cover, point.time);
        if let Some(p) = point.rain_probability {
            MetricMax::observe(&mut maxima.rain_probability, p, point.time);
        }
        if let Some(p) = point.thunderstorm_probability {
            MetricMax::observe(&mut maxima.thunderstorm_probability, p, point.time);
        }
        if let Some(g) = point.wind_gusts {
            MetricMax::observe(&mut maxima.wind_gusts, g, point.time);
        }
        if let Some(c) = point.cape {
            MetricMax::observe(&mut maxima.cape, c, point.time);
        }
        if let Some(li) = point.lifted_index {
            MetricMax::observe_min(&mut maxima.lifted_index, li, point.time);
        }

        risks.extend(analyze_point(point, thresholds));
    }

    let risk = risk_model.map_or(0.0, |model| compute_risk(&metric_values(&maxima), model));
    let summary = generate_summary(&risks, &maxima);

    info!(
        risks = risks.len(),
        risk_score = format!("{risk:.2}"),
        "weather analysis completed"
    );

    WeatherAnalysis {
        risks,
        maxima,
        risk,
        summary,
    }
}

/// Check a single sample against the base thresholds (strict `>`)
fn analyze_point(point: &WeatherPoint, thresholds: &Thresholds) -> Vec<WeatherRisk> {
    let mut risks = Vec::new();

    if let Some(p) = point.rain_probability
        && p > thresholds.rain_probability
    {
        risks.push(WeatherRisk {
            kind: RiskKind::Rain,
            level: RiskLevel::from_tiers(p, RAIN_PROBABILITY_TIERS),
            value: p,
            threshold: thresholds.rain_probability,
            time: point.time,
            description: format!(
                "Regenwahrscheinlichkeit {p:.0}% über Schwellwert {}%",
                thresholds.rain_probability
            ),
        });
    }

    if point.precipitation > thresholds.rain_amount {
        risks.push(WeatherRisk {
            kind: RiskKind::HeavyRain,
            level: RiskLevel::from_tiers(point.precipitation, PRECIPITATION_TIERS),
            value: point.precipitation,
            threshold: thresholds.rain_amount,
            time: point.time,
            description: format!(
                "Niederschlag {:.1}mm über Schwellwert {}mm",
                point.precipitation, thresholds.rain_amount
            ),
        });
    }

    if let Some(p) = point.thunderstorm_probability
        && p > thresholds.thunderstorm_probability
    {
        risks.push(WeatherRisk {
            kind: RiskKind::Thunderstorm,
            level: RiskLevel::from_tiers(p, THUNDERSTORM_TIERS),
            value: p,
            threshold: thresholds.thunderstorm_probability,
            time: point.time,
            description: format!(
                "Gewitterwahrscheinlichkeit {p:.0}% über Schwellwert {}%",
                thresholds.thunderstorm_probability
            ),
        });
    }

    if point.wind_speed > thresholds.wind_speed {
        risks.push(WeatherRisk {
            kind: RiskKind::HighWind,
            level: RiskLevel::from_tiers(point.wind_speed, WIND_TIERS),
            value: point.wind_speed,
            threshold: thresholds.wind_speed,
            time: point.time,
            description: format!(
                "Windgeschwindigkeit {:.0} km/h über Schwellwert {} km/h",
                point.wind_speed, thresholds.wind_speed
            ),
        });
    }

    if point.cloud_cover > thresholds.cloud_cover {
        risks.push(WeatherRisk {
            kind: RiskKind::Overcast,
            level: RiskLevel::from_tiers(point.cloud_cover, CLOUD_TIERS),
            value: point.cloud_cover,
            threshold: thresholds.cloud_cover,
            time: point.time,
            description: format!(
                "Bewölkung {:.0}% über Schwellwert {}%",
                point.cloud_cover, thresholds.cloud_cover
            ),
        });
    }

    if point.temperature > thresholds.temperature {
        risks.push(WeatherRisk {
            kind: RiskKind::HeatWave,
            level: RiskLevel::from_tiers(point.temperature, TEMPERATURE_TIERS),
            value: point.temperature,
            threshold: thresholds.temperature,
            time: point.time,
            description: format!(
                "Temperatur {:.1}°C über Schwellwert {}°C",
                point.temperature, thresholds.temperature
            ),
        });
    }

    risks
}

/// Flatten the maxima table into named metric values for the risk model
#[must_use]
pub fn metric_values(maxima: &WeatherMaxima) -> BTreeMap<String, f64> {
    let mut values = BTreeMap::new();
    let mut put = |key: &str, slot: Option<MetricMax>| {
        if let Some(max) = slot {
            values.insert(key.to_string(), max.value);
        }
    };
    put("temperature", maxima.temperature);
    put("precipitation", maxima.precipitation);
    put("rain_probability", maxima.rain_probability);
    put("wind_speed", maxima.wind_speed);
    put("wind_gusts", maxima.wind_gusts);
    put("cloud_cover", maxima.cloud_cover);
    put("thunderstorm_probability", maxima.thunderstorm_probability);
    put("cape", maxima.cape);
    put("lifted_index", maxima.lifted_index);
    values
}

/// Compute the weighted risk score in [0, 1]
///
/// Each model entry contributes its weight when its metric crosses the
/// configured threshold. Entries without a threshold or with a
/// non-positive weight are skipped, as are metrics without a value. The
/// lifted index triggers below its threshold, everything else above.
pub fn compute_risk(metrics: &BTreeMap<String, f64>, model: &RiskModel) -> f64 {
    let mut total = 0.0;

    for (parameter, settings) in model {
        let Some(threshold) = settings.threshold else {
            continue;
        };
        if settings.weight <= 0.0 {
            continue;
        }
        let Some(&value) = metrics.get(parameter) else {
            continue;
        };

        let exceeded = if parameter == "lifted_index" {
            value < threshold
        } else {
            value > threshold
        };

        if exceeded {
            debug!(parameter, value, threshold, "risk model threshold crossed");
            total += settings.weight;
        }
    }

    total.min(1.0)
}

/// One-line German summary: grouped risks, most urgent type first, then
/// the headline maxima
fn generate_summary(risks: &[WeatherRisk], maxima: &WeatherMaxima) -> String {
    if risks.is_empty() {
        return "Keine kritischen Wetterbedingungen erkannt.".to_string();
    }

    const ORDER: [RiskKind; 6] = [
        RiskKind::Thunderstorm,
        RiskKind::HeavyRain,
        RiskKind::Rain,
        RiskKind::HighWind,
        RiskKind::HeatWave,
        RiskKind::Overcast,
    ];

    let mut parts = Vec::new();
    for kind in ORDER {
        let highest = risks
            .iter()
            .filter(|r| r.kind == kind)
            .max_by_key(|r| r.level);
        if let Some(risk) = highest {
            parts.push(format!(
                "{}: {} ({:.1})",
                kind.label(),
                risk.level.as_str().to_uppercase(),
                risk.value
            ));
        }
    }

    if let Some(max) = maxima.precipitation.filter(|m| m.value > 0.0) {
        parts.push(format!("Max. Niederschlag: {:.1}mm", max.value));
    }
    if let Some(max) = maxima.wind_speed.filter(|m| m.value > 0.0) {
        parts.push(format!("Max. Wind: {:.0} km/h", max.value));
    }
    if let Some(max) = maxima.temperature.filter(|m| m.value > 0.0) {
        parts.push(format!("Max. Temperatur: {:.1}°C", max.value));
    }

    parts.join(" | ")
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn risk_score_is_always_in_unit_interval(
            weights in proptest::collection::vec(0.0_f64..5.0, 1..6),
            value in 0.0_f64..100.0
        ) {
            let mut metrics = BTreeMap::new();
            let mut model = RiskModel::new();
            for (i, weight) in weights.iter().enumerate() {
                let name = format!("metric_{i}");
                metrics.insert(name.clone(), value);
                model.insert(name, RiskParameter { threshold: Some(0.0), weight: *weight });
            }

            let risk = compute_risk(&metrics, &model);
            prop_assert!((0.0..=1.0).contains(&risk));
        }
    }
}
