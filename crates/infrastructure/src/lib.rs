//! Infrastructure layer for the GR20 weather monitor
//!
//! Implements the application ports against the real world: HTTP weather
//! providers, Gmail SMTP, the GPS share page, the stage plan file and the
//! JSON state files. Also owns configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod stages;

pub use config::{AppConfig, Secrets, ShareMapSettings, SmtpSettings};
pub use stages::StagePlan;
