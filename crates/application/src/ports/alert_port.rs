//! Vigilance alert port

use async_trait::async_trait;
use domain::VigilanceAlert;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for department-level weather warnings
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertPort: Send + Sync {
    /// Fetch current alerts for a department code (e.g. "2A")
    ///
    /// Adapters degrade to an empty list when the warning service is down;
    /// an error here means the request itself was malformed.
    async fn current_alerts(
        &self,
        department: &str,
    ) -> Result<Vec<VigilanceAlert>, ApplicationError>;
}
