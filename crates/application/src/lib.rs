//! Application layer - Use cases and orchestration
//!
//! Contains the weather analysis and reporting logic, port definitions for
//! external systems, and the monitor service that ties a run together.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
