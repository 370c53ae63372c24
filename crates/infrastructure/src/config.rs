//! Application configuration
//!
//! Settings come from an optional YAML file plus `GR20_`-prefixed
//! environment variables; secrets come exclusively from the environment
//! (usually via a `.env` file loaded by the binary).

use application::error::ApplicationError;
use application::services::{
    DeltaThresholds, DynamicReportConfig, MonitorConfig, RiskModel, SendSchedule, Thresholds,
    WarnThresholds,
};
use chrono::NaiveDate;
use domain::EmailAddress;
use integration_meteofrance::{AromeConfig, MeteoFranceConfig, TokenConfig};
use integration_openmeteo::OpenMeteoConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// First day of the hike; day N of the stage plan is `startdatum + N`
    pub startdatum: NaiveDate,

    /// Path to the ordered stage plan file
    #[serde(default = "default_stage_file")]
    pub stage_file: String,

    /// Vigilance department code
    #[serde(default = "default_department")]
    pub department: String,

    /// Base risk thresholds per metric
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Minimum deteriorations that count as a significant change
    #[serde(default)]
    pub delta_thresholds: DeltaThresholds,

    /// Weighted risk model, absent means the built-in default weights
    #[serde(default)]
    pub risk_model: Option<RiskModel>,

    /// Escalation thresholds for the warning text
    #[serde(default)]
    pub warn_thresholds: WarnThresholds,

    /// Wall-clock times of the two scheduled reports
    #[serde(default)]
    pub send_schedule: SendSchedule,

    /// Limits for risk-triggered dynamic reports
    #[serde(default)]
    pub dynamic_reports: DynamicReportConfig,

    /// SMTP delivery settings
    pub smtp: SmtpSettings,

    /// Météo-France endpoints (primary provider)
    #[serde(default)]
    pub meteofrance: MeteoFranceSettings,

    /// Open-Meteo endpoint (fallback provider)
    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,

    /// GPS tracker share page, absent disables position lookups
    #[serde(default)]
    pub sharemap: Option<ShareMapSettings>,

    /// State file locations
    #[serde(default)]
    pub state: StateSettings,
}

fn default_stage_file() -> String {
    "etappen.json".to_string()
}

fn default_department() -> String {
    "2A".to_string()
}

/// SMTP delivery settings
///
/// The app password is not part of the file; it is injected from the
/// environment when the client is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// 587 for STARTTLS, 465 for implicit TLS
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Account address, also used as the From header
    pub user: String,

    /// Report recipient
    pub to: String,

    /// Subject prefix for all reports
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_subject() -> String {
    "GR20 Wetter".to_string()
}

/// Météo-France endpoint configuration, all defaulting to the public portal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeteoFranceSettings {
    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub forecast: MeteoFranceConfig,

    #[serde(default)]
    pub arome: AromeConfig,
}

/// GPS tracker share page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareMapSettings {
    /// KML share page URL
    pub url: String,

    /// Connection timeout in seconds (default: 15)
    #[serde(default = "default_sharemap_timeout")]
    pub timeout_secs: u64,
}

const fn default_sharemap_timeout() -> u64 {
    15
}

/// State file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSettings {
    #[serde(default = "default_warning_state_file")]
    pub warning_state_file: String,

    #[serde(default = "default_report_state_file")]
    pub report_state_file: String,
}

fn default_warning_state_file() -> String {
    "warning_state.json".to_string()
}

fn default_report_state_file() -> String {
    "report_state.json".to_string()
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            warning_state_file: default_warning_state_file(),
            report_state_file: default_report_state_file(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file and the environment
    ///
    /// Without an explicit path, `config.{yaml,toml,...}` in the working
    /// directory is used when present. `GR20_`-prefixed environment
    /// variables override file values, with `__` as the section separator
    /// (e.g. `GR20_SMTP__HOST`).
    ///
    /// # Errors
    ///
    /// Fails when the file is malformed or a required field is missing.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let file = path.map_or_else(
            || config::File::with_name("config").required(false),
            |p| config::File::with_name(p).required(true),
        );
        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("GR20")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Validated report recipient address
    ///
    /// # Errors
    ///
    /// Fails when `smtp.to` is not a plausible email address.
    pub fn recipient(&self) -> Result<EmailAddress, ApplicationError> {
        EmailAddress::try_from(self.smtp.to.as_str()).map_err(ApplicationError::from)
    }

    /// Monitor settings derived from this configuration
    ///
    /// # Errors
    ///
    /// Fails when the recipient address is invalid.
    pub fn monitor_config(&self) -> Result<MonitorConfig, ApplicationError> {
        Ok(MonitorConfig {
            recipient: self.recipient()?,
            base_subject: self.smtp.subject.clone(),
            department: self.department.clone(),
            thresholds: self.thresholds,
            risk_model: self.risk_model.clone(),
            warn_thresholds: self.warn_thresholds,
            deltas: self.delta_thresholds,
        })
    }
}

/// Secrets injected from the environment
///
/// All three are required; a missing variable aborts the run before any
/// network call is made.
pub struct Secrets {
    pub meteofrance_client_id: String,
    pub meteofrance_client_secret: SecretString,
    pub gmail_app_password: SecretString,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("meteofrance_client_id", &self.meteofrance_client_id)
            .field("meteofrance_client_secret", &"[REDACTED]")
            .field("gmail_app_password", &"[REDACTED]")
            .finish()
    }
}

impl Secrets {
    /// Read all required secrets from the environment
    ///
    /// # Errors
    ///
    /// Names the first missing variable.
    pub fn from_env() -> Result<Self, ApplicationError> {
        Ok(Self {
            meteofrance_client_id: required_env("METEOFRANCE_CLIENT_ID")?,
            meteofrance_client_secret: required_env("METEOFRANCE_CLIENT_SECRET")?.into(),
            gmail_app_password: required_env("GMAIL_APP_PW")?.into(),
        })
    }
}

fn required_env(name: &str) -> Result<String, ApplicationError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApplicationError::Configuration(format!(
            "environment variable {name} is not set"
        ))),
    }
}
