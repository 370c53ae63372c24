//! Monitoring orchestration
//!
//! One `run` is one cron tick: resolve the stage, fetch forecasts, analyse,
//! decide whether a report is due, send it and persist the state files.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use domain::{
    EmailAddress, GeoLocation, MetricMax, Stage, WarningState, WeatherData, WeatherMaxima,
    WeatherPoint,
};
use tracing::{info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{
    AlertPort, EmailPort, ForecastPort, PositionPort, ReportStateStore, StagePort,
    WarningStateStore,
};
use crate::services::analysis::{RiskModel, Thresholds, analyze_weather, merge_weather_sources};
use crate::services::change::{DeltaThresholds, has_significant_change};
use crate::services::report::{ReportContext, ReportKind, format_report, format_subject};
use crate::services::scheduler::{ReportDecision, ReportScheduler, ScheduledSlot};
use crate::services::warntext::{WarnThresholds, generate_warntext};

/// Requested run behaviour
///
/// `Auto` is the cron default and lets the scheduler decide; the other
/// modes force one report kind for manual runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Auto,
    Morning,
    Evening,
    Dynamic,
}

/// What a single run did
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOutcome {
    pub decision: ReportDecision,
    pub email_sent: bool,
    /// Aggregate risk score in [0, 1]
    pub risk: f64,
    /// Human-readable analysis summary
    pub summary: String,
}

/// Adapter handles the monitor orchestrates
pub struct MonitorPorts {
    /// Forecast providers in precedence order, merged pessimistically
    pub forecasts: Vec<Arc<dyn ForecastPort>>,
    pub alerts: Arc<dyn AlertPort>,
    pub email: Arc<dyn EmailPort>,
    pub position: Arc<dyn PositionPort>,
    pub stages: Arc<dyn StagePort>,
    pub warning_store: Arc<dyn WarningStateStore>,
    pub report_store: Arc<dyn ReportStateStore>,
}

/// Static settings for a monitor run
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub recipient: EmailAddress,
    /// Subject prefix, e.g. "GR20 Wetter"
    pub base_subject: String,
    /// Vigilance department code, "2A" for Corse-du-Sud
    pub department: String,
    pub thresholds: Thresholds,
    pub risk_model: Option<RiskModel>,
    pub warn_thresholds: WarnThresholds,
    pub deltas: DeltaThresholds,
}

pub struct MonitorService {
    ports: MonitorPorts,
    scheduler: ReportScheduler,
    config: MonitorConfig,
}

impl MonitorService {
    #[must_use]
    pub const fn new(ports: MonitorPorts, scheduler: ReportScheduler, config: MonitorConfig) -> Self {
        Self {
            ports,
            scheduler,
            config,
        }
    }

    /// Run one monitoring cycle at the current time
    ///
    /// # Errors
    ///
    /// Fails when no forecast source is reachable, no stage can be
    /// resolved, or sending or persisting fails.
    pub async fn run(&self, mode: RunMode) -> Result<MonitorOutcome, ApplicationError> {
        self.run_at(Utc::now(), mode).await
    }

    /// Run one monitoring cycle at a fixed instant
    #[instrument(skip(self))]
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        mode: RunMode,
    ) -> Result<MonitorOutcome, ApplicationError> {
        let today = now.date_naive();

        let position = match self.ports.position.current_position().await {
            Ok(position) => position,
            Err(error) => {
                warn!(%error, "position lookup failed, falling back to stage plan");
                None
            },
        };

        let stage = self.resolve_stage(today, position.as_ref().map(|p| &p.location))?;
        let location = position.as_ref().map_or_else(
            || stage_start(&stage),
            |p| Ok(p.location),
        )?;

        let sources = self.fetch_forecasts(&location).await?;
        let merged = merge_weather_sources(&sources);
        let analysis = analyze_weather(&sources, &self.config.thresholds, self.config.risk_model.as_ref());

        let report_state = self.ports.report_store.load().await?.unwrap_or_default();
        let decision = match mode {
            RunMode::Auto => self.scheduler.decide(&now, analysis.risk, &report_state),
            RunMode::Morning => ReportDecision::Scheduled(ScheduledSlot::Morning),
            RunMode::Evening => ReportDecision::Scheduled(ScheduledSlot::Evening),
            RunMode::Dynamic => ReportDecision::Dynamic,
        };

        let previous_warning = self.ports.warning_store.load().await?;
        let mut warning = snapshot_maxima(&analysis.maxima, previous_warning.as_ref());

        let kind = match decision {
            ReportDecision::Scheduled(ScheduledSlot::Morning) => ReportKind::Morning,
            ReportDecision::Scheduled(ScheduledSlot::Evening) => ReportKind::Evening,
            ReportDecision::Dynamic => ReportKind::Dynamic,
            ReportDecision::None => {
                info!(risk = analysis.risk, "no report due");
                self.ports.warning_store.save(&warning).await?;
                return Ok(MonitorOutcome {
                    decision,
                    email_sent: false,
                    risk: analysis.risk,
                    summary: analysis.summary,
                });
            },
        };

        let alerts = match self.ports.alerts.current_alerts(&self.config.department).await {
            Ok(alerts) => alerts,
            Err(error) => {
                warn!(%error, "vigilance lookup failed, reporting without alerts");
                Vec::new()
            },
        };

        let (report_stage, next_stage) = self.report_stages(kind, today, &stage)?;
        let outlook_date = match kind {
            ReportKind::Evening => today + Duration::days(2),
            ReportKind::Morning | ReportKind::Dynamic => today + Duration::days(1),
        };

        let ctx = ReportContext {
            kind,
            stage: &report_stage,
            next_stage: next_stage.as_deref(),
            analysis: &analysis,
            night_temperature: (kind == ReportKind::Evening)
                .then(|| night_minimum(&merged.points, today + Duration::days(1)))
                .flatten(),
            thunderstorm_outlook: thunderstorm_outlook(&merged.points, outlook_date),
            alerts: &alerts,
        };
        let mut body = format_report(&ctx);

        if let Some(text) = generate_warntext(analysis.risk, &self.config.warn_thresholds)?
            && has_significant_change(&warning, previous_warning.as_ref(), &self.config.deltas)
        {
            body.push('\n');
            body.push_str(&text);
            warning.last_warning_time = Some(now);
        }

        let subject = format_subject(&self.config.base_subject, &report_stage, kind, &alerts);
        self.ports
            .email
            .send(&self.config.recipient, &subject, &body)
            .await?;
        info!(%subject, "report sent");

        let mut report_state = report_state;
        self.scheduler
            .record_report(&mut report_state, &now, analysis.risk, decision);
        self.ports.report_store.save(&report_state).await?;
        self.ports.warning_store.save(&warning).await?;

        Ok(MonitorOutcome {
            decision,
            email_sent: true,
            risk: analysis.risk,
            summary: analysis.summary,
        })
    }

    /// Today's stage, preferring the live position over the date plan
    fn resolve_stage(
        &self,
        today: NaiveDate,
        position: Option<&GeoLocation>,
    ) -> Result<Stage, ApplicationError> {
        if let Some(location) = position
            && let Some(stage) = self.ports.stages.nearest_stage(location)?
        {
            return Ok(stage);
        }
        self.ports
            .stages
            .stage_for_date(today)?
            .ok_or_else(|| {
                ApplicationError::Configuration(format!("no stage planned for {today}"))
            })
    }

    async fn fetch_forecasts(
        &self,
        location: &GeoLocation,
    ) -> Result<Vec<WeatherData>, ApplicationError> {
        let mut sources = Vec::with_capacity(self.ports.forecasts.len());
        for port in &self.ports.forecasts {
            match port.fetch_forecast(location).await {
                Ok(data) if !data.is_empty() => sources.push(data),
                Ok(_) => warn!("forecast source returned no data points"),
                Err(error) => warn!(%error, "forecast source failed"),
            }
        }
        if sources.is_empty() {
            return Err(ApplicationError::ExternalService(
                "all forecast sources failed".to_string(),
            ));
        }
        Ok(sources)
    }

    /// Stage names shown in the report
    ///
    /// Evening reports cover tomorrow's stage and preview the day after.
    fn report_stages(
        &self,
        kind: ReportKind,
        today: NaiveDate,
        current: &Stage,
    ) -> Result<(String, Option<String>), ApplicationError> {
        if kind != ReportKind::Evening {
            return Ok((current.name.clone(), None));
        }
        let tomorrow = self
            .ports
            .stages
            .stage_for_date(today + Duration::days(1))?
            .map_or_else(|| current.name.clone(), |s| s.name);
        let day_after = self
            .ports
            .stages
            .stage_for_date(today + Duration::days(2))?
            .map(|s| s.name);
        Ok((tomorrow, day_after))
    }
}

fn stage_start(stage: &Stage) -> Result<GeoLocation, ApplicationError> {
    let locations = stage
        .locations()
        .map_err(domain::DomainError::InvalidCoordinates)?;
    locations.first().copied().ok_or_else(|| {
        ApplicationError::Configuration(format!("stage '{}' has no waypoints", stage.name))
    })
}

fn snapshot_maxima(maxima: &WeatherMaxima, previous: Option<&WarningState>) -> WarningState {
    let value = |slot: Option<MetricMax>| slot.map_or(0.0, |m| m.value);
    WarningState::snapshot(
        value(maxima.thunderstorm_probability),
        value(maxima.precipitation),
        value(maxima.wind_speed),
        value(maxima.temperature),
        value(maxima.cloud_cover),
        previous,
    )
}

/// Minimum temperature over the samples of one calendar date
fn night_minimum(points: &[WeatherPoint], date: NaiveDate) -> Option<f64> {
    points
        .iter()
        .filter(|p| p.time.date_naive() == date)
        .map(|p| p.temperature)
        .fold(None, |min, t| {
            Some(min.map_or(t, |m: f64| if t < m { t } else { m }))
        })
}

/// Highest thunderstorm probability forecast for one calendar date
fn thunderstorm_outlook(points: &[WeatherPoint], date: NaiveDate) -> Option<MetricMax> {
    let mut outlook = None;
    for point in points {
        if point.time.date_naive() != date {
            continue;
        }
        if let Some(p) = point.thunderstorm_probability {
            MetricMax::observe(&mut outlook, p, point.time);
        }
    }
    outlook
}
