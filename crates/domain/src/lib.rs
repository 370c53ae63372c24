//! Domain layer for the GR20 weather monitor
//!
//! Contains entities, value objects, and domain errors shared by all other
//! crates. This layer has no I/O and no external service knowledge.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
