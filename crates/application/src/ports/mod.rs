//! Port definitions - interfaces implemented by infrastructure adapters

mod alert_port;
mod email_port;
mod forecast_port;
mod position_port;
mod stage_port;
mod state_store;

pub use alert_port::AlertPort;
pub use email_port::EmailPort;
pub use forecast_port::ForecastPort;
pub use position_port::PositionPort;
pub use stage_port::StagePort;
pub use state_store::{ReportStateStore, WarningStateStore};

#[cfg(test)]
pub use alert_port::MockAlertPort;
#[cfg(test)]
pub use email_port::MockEmailPort;
#[cfg(test)]
pub use forecast_port::MockForecastPort;
#[cfg(test)]
pub use position_port::MockPositionPort;
#[cfg(test)]
pub use stage_port::MockStagePort;
#[cfg(test)]
pub use state_store::{MockReportStateStore, MockWarningStateStore};
