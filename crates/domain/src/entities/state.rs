//! Persisted monitor state
//!
//! Both structs are stored as flat JSON files between runs. The process is
//! short-lived, so these snapshots are the only memory it has.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the worst conditions seen during the last check
///
/// Used to decide whether conditions have deteriorated enough to justify an
/// unscheduled warning. Cloud cover is recorded but never compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningState {
    pub max_thunderstorm_probability: f64,
    pub max_precipitation: f64,
    pub max_wind_speed: f64,
    pub max_temperature: f64,
    pub max_cloud_cover: f64,
    /// When the snapshot was taken
    pub last_check: DateTime<Utc>,
    /// When the last warning was actually sent, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_warning_time: Option<DateTime<Utc>>,
}

impl WarningState {
    /// Build a snapshot for the current check, preserving the warning time
    /// from a previous snapshot
    #[must_use]
    pub fn snapshot(
        max_thunderstorm_probability: f64,
        max_precipitation: f64,
        max_wind_speed: f64,
        max_temperature: f64,
        max_cloud_cover: f64,
        previous: Option<&Self>,
    ) -> Self {
        Self {
            max_thunderstorm_probability,
            max_precipitation,
            max_wind_speed,
            max_temperature,
            max_cloud_cover,
            last_check: Utc::now(),
            last_warning_time: previous.and_then(|p| p.last_warning_time),
        }
    }
}

/// Bookkeeping for the report scheduler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scheduled_report: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dynamic_report: Option<DateTime<Utc>>,
    /// Dynamic reports sent on `last_report_date`
    #[serde(default)]
    pub daily_dynamic_report_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_risk_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_report_date: Option<NaiveDate>,
}
