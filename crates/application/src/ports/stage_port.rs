//! Trail stage lookup port

use chrono::NaiveDate;
use domain::{GeoLocation, Stage};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for resolving GR20 stages
#[cfg_attr(test, automock)]
pub trait StagePort: Send + Sync {
    /// Stage planned for a calendar date, `None` past the end of the plan
    fn stage_for_date(&self, date: NaiveDate) -> Result<Option<Stage>, ApplicationError>;

    /// Stage whose waypoints lie closest to a position
    fn nearest_stage(&self, location: &GeoLocation) -> Result<Option<Stage>, ApplicationError>;
}
