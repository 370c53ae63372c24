//! Port implementations backed by the integration crates

mod email_adapter;
mod position_adapter;
mod vigilance_adapter;
mod weather_adapter;

pub use email_adapter::GmailEmailAdapter;
pub use position_adapter::{DisabledPositionAdapter, ShareMapAdapter};
pub use vigilance_adapter::VigilanceAdapter;
pub use weather_adapter::WeatherAdapter;
