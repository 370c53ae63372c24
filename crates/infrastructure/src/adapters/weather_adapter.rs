//! Forecast adapter with provider fallback
//!
//! Météo-France is the primary provider; its forecast is enriched with
//! AROME instability values when available. Any primary failure falls back
//! to Open-Meteo. Only when both providers fail does the run error.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::ForecastPort;
use async_trait::async_trait;
use domain::{GeoLocation, WeatherData};
use integration_meteofrance::{AromeClient, MeteoFranceClient, MeteoFranceError, TokenError};
use integration_openmeteo::{OpenMeteoClient, OpenMeteoError};
use tracing::{debug, instrument, warn};

/// Forecast retrieval against the real providers
#[derive(Debug)]
pub struct WeatherAdapter {
    meteofrance: Arc<MeteoFranceClient>,
    arome: AromeClient,
    open_meteo: OpenMeteoClient,
}

impl WeatherAdapter {
    #[must_use]
    pub const fn new(
        meteofrance: Arc<MeteoFranceClient>,
        arome: AromeClient,
        open_meteo: OpenMeteoClient,
    ) -> Self {
        Self {
            meteofrance,
            arome,
            open_meteo,
        }
    }

    /// Merge AROME instability values into a forecast series
    ///
    /// The WCS coverage is not hour-resolved, so the worst values over the
    /// window apply to every sample. Enrichment failures are tolerated.
    async fn enrich_with_instability(&self, data: &mut WeatherData, location: &GeoLocation) {
        match self.arome.fetch_instability(location).await {
            Ok(sample) if !sample.is_empty() => {
                debug!(?sample, "applying instability values");
                for point in &mut data.points {
                    if point.cape.is_none() {
                        point.cape = sample.cape;
                    }
                    if point.lifted_index.is_none() {
                        point.lifted_index = sample.lifted_index;
                    }
                }
            },
            Ok(_) => debug!("no instability values available"),
            Err(error) => warn!(%error, "instability enrichment failed"),
        }
    }
}

#[async_trait]
impl ForecastPort for WeatherAdapter {
    #[instrument(skip(self), fields(lat = %location.latitude(), lon = %location.longitude()))]
    async fn fetch_forecast(
        &self,
        location: &GeoLocation,
    ) -> Result<WeatherData, ApplicationError> {
        match self.meteofrance.fetch_forecast(location).await {
            Ok(mut data) => {
                self.enrich_with_instability(&mut data, location).await;
                Ok(data)
            },
            Err(error) => {
                warn!(%error, "Météo-France forecast failed, falling back to Open-Meteo");
                self.open_meteo
                    .fetch_forecast(location)
                    .await
                    .map_err(map_openmeteo_error)
            },
        }
    }
}

/// Map a Météo-France error to an application error
pub(super) fn map_meteofrance_error(err: MeteoFranceError) -> ApplicationError {
    match err {
        MeteoFranceError::Auth(TokenError::CredentialsRejected) => {
            ApplicationError::Configuration("Météo-France credentials rejected".to_string())
        },
        MeteoFranceError::RateLimitExceeded => ApplicationError::RateLimited,
        other => ApplicationError::ExternalService(other.to_string()),
    }
}

fn map_openmeteo_error(err: OpenMeteoError) -> ApplicationError {
    match err {
        OpenMeteoError::RateLimitExceeded => ApplicationError::RateLimited,
        other => ApplicationError::ExternalService(other.to_string()),
    }
}
