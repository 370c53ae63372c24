//! Application services

mod analysis;
mod change;
mod monitor;
mod report;
mod scheduler;
mod warntext;

pub use analysis::{
    RiskModel, RiskParameter, Thresholds, analyze_weather, compute_risk, merge_weather_sources,
    metric_values,
};
pub use change::{DeltaThresholds, has_significant_change};
pub use monitor::{MonitorConfig, MonitorOutcome, MonitorPorts, MonitorService, RunMode};
pub use report::{ReportContext, ReportKind, format_report, format_subject};
pub use scheduler::{
    DynamicReportConfig, ReportDecision, ReportScheduler, ScheduledSlot, SendSchedule,
};
pub use warntext::{WarnThresholds, generate_warntext};
