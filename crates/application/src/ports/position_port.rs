//! Live tracker position port

use async_trait::async_trait;
use domain::CurrentPosition;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for fetching the hiker's last reported GPS position
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PositionPort: Send + Sync {
    /// Fetch the most recent position, `None` when the share page carries
    /// no placemark yet
    async fn current_position(&self) -> Result<Option<CurrentPosition>, ApplicationError>;
}
