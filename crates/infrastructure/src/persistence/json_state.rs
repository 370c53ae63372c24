//! Flat-file JSON state stores
//!
//! A missing file means a fresh start; an unreadable file is treated the
//! same way, with a warning, so a corrupted state never blocks a report.
//! Saves overwrite the whole file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use application::error::ApplicationError;
use application::ports::{ReportStateStore, WarningStateStore};
use async_trait::async_trait;
use domain::{ReportState, WarningState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ApplicationError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "state file absent, starting fresh");
            return Ok(None);
        },
        Err(e) => {
            return Err(ApplicationError::Persistence(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        },
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            warn!(path = %path.display(), %error, "state file unreadable, starting fresh");
            Ok(None)
        },
    }
}

async fn save_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), ApplicationError> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| ApplicationError::Persistence(format!("cannot serialize state: {e}")))?;
    tokio::fs::write(path, json).await.map_err(|e| {
        ApplicationError::Persistence(format!("cannot write {}: {e}", path.display()))
    })
}

/// Warning-state snapshot persisted as one JSON file
#[derive(Debug, Clone)]
pub struct JsonWarningStateStore {
    path: PathBuf,
}

impl JsonWarningStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WarningStateStore for JsonWarningStateStore {
    async fn load(&self) -> Result<Option<WarningState>, ApplicationError> {
        load_json(&self.path).await
    }

    async fn save(&self, state: &WarningState) -> Result<(), ApplicationError> {
        save_json(&self.path, state).await
    }
}

/// Report scheduler bookkeeping persisted as one JSON file
#[derive(Debug, Clone)]
pub struct JsonReportStateStore {
    path: PathBuf,
}

impl JsonReportStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReportStateStore for JsonReportStateStore {
    async fn load(&self) -> Result<Option<ReportState>, ApplicationError> {
        load_json(&self.path).await
    }

    async fn save(&self, state: &ReportState) -> Result<(), ApplicationError> {
        save_json(&self.path, state).await
    }
}
