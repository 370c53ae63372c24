//! Value Objects - Immutable, identity-less domain primitives

mod email_address;
mod geo_location;
mod risk;

pub use email_address::EmailAddress;
pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use risk::{AlertLevel, RiskKind, RiskLevel};
