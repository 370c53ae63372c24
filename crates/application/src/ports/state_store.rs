//! State persistence ports
//!
//! Stores are last-write-wins; the monitor is the only writer per
//! invocation and runs are serialized by cron.

use async_trait::async_trait;
use domain::{ReportState, WarningState};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Persistence for the warning-state snapshot
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WarningStateStore: Send + Sync {
    /// Load the previous snapshot, `None` when absent or unreadable
    async fn load(&self) -> Result<Option<WarningState>, ApplicationError>;

    /// Overwrite the snapshot
    async fn save(&self, state: &WarningState) -> Result<(), ApplicationError>;
}

/// Persistence for report scheduler bookkeeping
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReportStateStore: Send + Sync {
    /// Load the previous state, `None` when absent or unreadable
    async fn load(&self) -> Result<Option<ReportState>, ApplicationError>;

    /// Overwrite the state
    async fn save(&self, state: &ReportState) -> Result<(), ApplicationError>;
}
