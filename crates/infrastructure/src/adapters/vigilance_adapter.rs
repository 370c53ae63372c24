//! Vigilance alert adapter

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::AlertPort;
use async_trait::async_trait;
use domain::VigilanceAlert;
use integration_meteofrance::MeteoFranceClient;
use tracing::{debug, instrument};

use super::weather_adapter::map_meteofrance_error;

/// Department-level weather warnings from the vigilance bulletin
#[derive(Debug)]
pub struct VigilanceAdapter {
    client: Arc<MeteoFranceClient>,
}

impl VigilanceAdapter {
    #[must_use]
    pub const fn new(client: Arc<MeteoFranceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlertPort for VigilanceAdapter {
    #[instrument(skip(self))]
    async fn current_alerts(
        &self,
        department: &str,
    ) -> Result<Vec<VigilanceAlert>, ApplicationError> {
        let alerts = self
            .client
            .fetch_vigilance(department)
            .await
            .map_err(map_meteofrance_error)?;
        debug!(count = alerts.len(), "vigilance alerts fetched");
        Ok(alerts)
    }
}
