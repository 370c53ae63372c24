//! Report scheduling
//!
//! Decides per invocation whether a scheduled or dynamic report is due.
//! The process itself is launched by cron every few minutes; all timing
//! state lives in the persisted `ReportState`.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use domain::ReportState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApplicationError;

/// Wall-clock send times for the two scheduled reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendSchedule {
    /// "HH:MM" local time of the morning report
    #[serde(default = "default_morning_time")]
    pub morning_time: String,
    /// "HH:MM" local time of the evening report
    #[serde(default = "default_evening_time")]
    pub evening_time: String,
}

fn default_morning_time() -> String {
    "04:30".to_string()
}

fn default_evening_time() -> String {
    "19:00".to_string()
}

impl Default for SendSchedule {
    fn default() -> Self {
        Self {
            morning_time: default_morning_time(),
            evening_time: default_evening_time(),
        }
    }
}

/// Limits for risk-triggered dynamic reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicReportConfig {
    /// Minimum absolute risk change since the last report
    #[serde(default = "default_risk_change_threshold")]
    pub risk_change_threshold: f64,
    /// Minimum minutes between two dynamic reports
    #[serde(default = "default_min_interval_min")]
    pub min_interval_min: i64,
    /// Maximum dynamic reports per calendar day
    #[serde(default = "default_max_daily_reports")]
    pub max_daily_reports: u32,
}

const fn default_risk_change_threshold() -> f64 {
    0.3
}

const fn default_min_interval_min() -> i64 {
    60
}

const fn default_max_daily_reports() -> u32 {
    3
}

impl Default for DynamicReportConfig {
    fn default() -> Self {
        Self {
            risk_change_threshold: default_risk_change_threshold(),
            min_interval_min: default_min_interval_min(),
            max_daily_reports: default_max_daily_reports(),
        }
    }
}

/// Which of the two fixed send minutes matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledSlot {
    Morning,
    Evening,
}

/// Outcome of a scheduling check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDecision {
    Scheduled(ScheduledSlot),
    Dynamic,
    None,
}

/// Gate for scheduled and dynamic reports
#[derive(Debug, Clone)]
pub struct ReportScheduler {
    morning: NaiveTime,
    evening: NaiveTime,
    dynamic: DynamicReportConfig,
}

impl ReportScheduler {
    /// Build a scheduler from configuration
    ///
    /// # Errors
    ///
    /// Fails when a schedule time is not a valid "HH:MM" string.
    pub fn new(
        schedule: &SendSchedule,
        dynamic: DynamicReportConfig,
    ) -> Result<Self, ApplicationError> {
        let parse = |label: &str, value: &str| {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| {
                ApplicationError::Configuration(format!("invalid {label} '{value}': {e}"))
            })
        };
        Ok(Self {
            morning: parse("morning_time", &schedule.morning_time)?,
            evening: parse("evening_time", &schedule.evening_time)?,
            dynamic,
        })
    }

    /// Decide what kind of report, if any, is due at `now`
    ///
    /// Scheduled reports take precedence over dynamic ones.
    pub fn decide<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        current_risk: f64,
        state: &ReportState,
    ) -> ReportDecision {
        if let Some(slot) = self.scheduled_slot(now) {
            info!(?slot, "scheduled report time matched");
            return ReportDecision::Scheduled(slot);
        }
        if self.dynamic_report_due(now, current_risk, state) {
            return ReportDecision::Dynamic;
        }
        ReportDecision::None
    }

    /// The slot whose send minute matches `now` exactly, if any
    fn scheduled_slot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<ScheduledSlot> {
        let wall = now.naive_local().time().format("%H:%M").to_string();
        if wall == self.morning.format("%H:%M").to_string() {
            Some(ScheduledSlot::Morning)
        } else if wall == self.evening.format("%H:%M").to_string() {
            Some(ScheduledSlot::Evening)
        } else {
            None
        }
    }

    fn dynamic_report_due<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        current_risk: f64,
        state: &ReportState,
    ) -> bool {
        let previous_risk = state.last_risk_value.unwrap_or(0.0);
        let risk_change = (current_risk - previous_risk).abs();
        if risk_change < self.dynamic.risk_change_threshold {
            debug!(risk_change, "risk change below dynamic threshold");
            return false;
        }

        let now_utc = now.with_timezone(&Utc);
        if let Some(last) = state.last_dynamic_report {
            let since_minutes = (now_utc - last).num_minutes();
            if since_minutes < self.dynamic.min_interval_min {
                debug!(since_minutes, "dynamic report interval not yet elapsed");
                return false;
            }
        }

        if self.daily_count(now, state) >= self.dynamic.max_daily_reports {
            debug!("daily dynamic report limit reached");
            return false;
        }

        info!(risk_change, "dynamic report conditions met");
        true
    }

    /// Dynamic reports already sent today; resets implicitly on date change
    fn daily_count<Tz: TimeZone>(&self, now: &DateTime<Tz>, state: &ReportState) -> u32 {
        if state.last_report_date == Some(now.naive_local().date()) {
            state.daily_dynamic_report_count
        } else {
            0
        }
    }

    /// Record a sent report into the state
    pub fn record_report<Tz: TimeZone>(
        &self,
        state: &mut ReportState,
        now: &DateTime<Tz>,
        risk: f64,
        decision: ReportDecision,
    ) {
        let today = now.naive_local().date();
        if state.last_report_date != Some(today) {
            state.daily_dynamic_report_count = 0;
            state.last_report_date = Some(today);
        }

        let now_utc = now.with_timezone(&Utc);
        match decision {
            ReportDecision::Dynamic => {
                state.last_dynamic_report = Some(now_utc);
                state.daily_dynamic_report_count += 1;
            },
            ReportDecision::Scheduled(_) => {
                state.last_scheduled_report = Some(now_utc);
            },
            ReportDecision::None => {},
        }
        state.last_risk_value = Some(risk);
    }
}
