//! JSON file persistence for the monitor state
//!
//! The process is short-lived; everything it remembers between runs lives
//! in two small JSON files next to the binary.

mod json_state;

pub use json_state::{JsonReportStateStore, JsonWarningStateStore};
