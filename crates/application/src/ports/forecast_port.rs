//! Forecast retrieval port
//!
//! An adapter behind this port may aggregate several providers; the
//! application only sees one forecast series per location.

use async_trait::async_trait;
use domain::{GeoLocation, WeatherData};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for hourly forecast retrieval
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ForecastPort: Send + Sync {
    /// Fetch the hourly forecast for a location
    ///
    /// Implementations decide how many hours/days the series covers; the
    /// monitor analyses whatever window comes back.
    async fn fetch_forecast(&self, location: &GeoLocation)
    -> Result<WeatherData, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ForecastPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ForecastPort>();
    }
}
