//! Stage plan lookup
//!
//! The plan is an ordered JSON array of stages; day N of the hike (counted
//! from the configured start date) walks stage N. A live GPS position can
//! override the calendar by picking the stage with the nearest waypoint.

use std::path::Path;

use application::error::ApplicationError;
use application::ports::StagePort;
use chrono::NaiveDate;
use domain::{DomainError, GeoLocation, Stage};
use tracing::{debug, info};

/// The ordered stage plan with its start date
#[derive(Debug, Clone)]
pub struct StagePlan {
    start_date: NaiveDate,
    stages: Vec<Stage>,
}

impl StagePlan {
    #[must_use]
    pub const fn new(start_date: NaiveDate, stages: Vec<Stage>) -> Self {
        Self { start_date, stages }
    }

    /// Load the plan from a JSON stage file
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, malformed or empty.
    pub fn load(path: impl AsRef<Path>, start_date: NaiveDate) -> Result<Self, ApplicationError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ApplicationError::Configuration(format!("cannot read stage file {}: {e}", path.display()))
        })?;
        let stages: Vec<Stage> = serde_json::from_slice(&bytes).map_err(|e| {
            ApplicationError::Configuration(format!("invalid stage file {}: {e}", path.display()))
        })?;
        if stages.is_empty() {
            return Err(ApplicationError::Configuration(format!(
                "stage file {} contains no stages",
                path.display()
            )));
        }
        info!(stages = stages.len(), %start_date, "loaded stage plan");
        Ok(Self::new(start_date, stages))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl StagePort for StagePlan {
    fn stage_for_date(&self, date: NaiveDate) -> Result<Option<Stage>, ApplicationError> {
        let day = (date - self.start_date).num_days();
        let Ok(index) = usize::try_from(day) else {
            debug!(%date, "date lies before the start of the plan");
            return Ok(None);
        };
        Ok(self.stages.get(index).cloned())
    }

    fn nearest_stage(&self, location: &GeoLocation) -> Result<Option<Stage>, ApplicationError> {
        let mut best: Option<(f64, &Stage)> = None;
        for stage in &self.stages {
            let distance = stage
                .distance_km(location)
                .map_err(DomainError::InvalidCoordinates)?;
            match best {
                Some((best_distance, _)) if best_distance <= distance => {},
                _ => best = Some((distance, stage)),
            }
        }
        Ok(best.map(|(distance, stage)| {
            debug!(stage = %stage.name, distance_km = distance, "nearest stage resolved");
            stage.clone()
        }))
    }
}
