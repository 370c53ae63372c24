//! Météo-France API integration
//!
//! Primary forecast source plus vigilance bulletins and AROME instability
//! grids. All endpoints authenticate through the shared OAuth2 token
//! provider.

pub mod arome;
pub mod client;
mod models;
pub mod token;

pub use arome::{AromeClient, AromeConfig, InstabilitySample};
pub use client::{MeteoFranceClient, MeteoFranceConfig, MeteoFranceError};
pub use token::{MeteoTokenProvider, TokenConfig, TokenError};
