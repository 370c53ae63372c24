//! GR20 Watch CLI
//!
//! One invocation is one monitoring cycle; cron is the scheduler. Without
//! `--mode` the run decides itself whether a report is due.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use application::ports::PositionPort;
use application::services::{MonitorPorts, MonitorService, ReportScheduler, RunMode};
use clap::{Parser, ValueEnum};
use infrastructure::adapters::{
    DisabledPositionAdapter, GmailEmailAdapter, ShareMapAdapter, VigilanceAdapter, WeatherAdapter,
};
use infrastructure::persistence::{JsonReportStateStore, JsonWarningStateStore};
use infrastructure::{AppConfig, Secrets, StagePlan};
use integration_email::{SmtpClient, SmtpConfig};
use integration_meteofrance::{AromeClient, MeteoFranceClient, MeteoTokenProvider};
use integration_openmeteo::OpenMeteoClient;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// GR20 trail weather monitor
#[derive(Parser)]
#[command(name = "gr20watch")]
#[command(author, version, about = "Weather monitoring and email reports for the GR20", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path (default: config.yaml in the working directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Force a report kind instead of letting the scheduler decide
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Morning,
    Evening,
    Dynamic,
}

const fn run_mode(mode: Option<Mode>) -> RunMode {
    match mode {
        None => RunMode::Auto,
        Some(Mode::Morning) => RunMode::Morning,
        Some(Mode::Evening) => RunMode::Evening,
        Some(Mode::Dynamic) => RunMode::Dynamic,
    }
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env values override the inherited environment, secrets live there
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(cli.verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let secrets = Secrets::from_env()?;
    let mode = run_mode(cli.mode);

    let service = build_service(&config, secrets)?;

    info!(?mode, "starting monitoring cycle");
    let outcome = service.run(mode).await?;

    if outcome.email_sent {
        println!("report sent ({:?})", outcome.decision);
    } else {
        println!("no report due");
    }
    println!("risk: {:.2}", outcome.risk);
    println!("{}", outcome.summary);

    Ok(())
}

/// Wire configuration and secrets into a ready-to-run monitor
fn build_service(config: &AppConfig, secrets: Secrets) -> anyhow::Result<MonitorService> {
    let tokens = Arc::new(MeteoTokenProvider::new(
        config.meteofrance.token.clone(),
        secrets.meteofrance_client_id,
        secrets.meteofrance_client_secret,
    )?);
    let meteofrance = Arc::new(MeteoFranceClient::new(
        config.meteofrance.forecast.clone(),
        Arc::clone(&tokens),
    )?);
    let arome = AromeClient::new(config.meteofrance.arome.clone(), Arc::clone(&tokens))?;
    let open_meteo = OpenMeteoClient::new(config.open_meteo.clone())?;
    let weather = WeatherAdapter::new(Arc::clone(&meteofrance), arome, open_meteo);

    let smtp = SmtpClient::new(SmtpConfig {
        host: config.smtp.host.clone(),
        port: config.smtp.port,
        user: config.smtp.user.clone(),
        password: secrets.gmail_app_password,
    });

    let position: Arc<dyn PositionPort> = match &config.sharemap {
        Some(settings) => Arc::new(ShareMapAdapter::new(settings.clone())?),
        None => Arc::new(DisabledPositionAdapter),
    };

    let stages = StagePlan::load(&config.stage_file, config.startdatum)?;

    let ports = MonitorPorts {
        forecasts: vec![Arc::new(weather)],
        alerts: Arc::new(VigilanceAdapter::new(meteofrance)),
        email: Arc::new(GmailEmailAdapter::new(smtp)),
        position,
        stages: Arc::new(stages),
        warning_store: Arc::new(JsonWarningStateStore::new(&config.state.warning_state_file)),
        report_store: Arc::new(JsonReportStateStore::new(&config.state.report_state_file)),
    };

    let scheduler = ReportScheduler::new(&config.send_schedule, config.dynamic_reports)?;
    Ok(MonitorService::new(ports, scheduler, config.monitor_config()?))
}
