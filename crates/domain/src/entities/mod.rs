//! Domain entities

mod stage;
mod state;
mod weather;

pub use stage::{CurrentPosition, Stage, StagePoint};
pub use state::{ReportState, WarningState};
pub use weather::{
    MetricMax, VigilanceAlert, WeatherAnalysis, WeatherData, WeatherMaxima, WeatherPoint,
    WeatherRisk,
};
