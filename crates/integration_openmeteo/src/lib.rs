//! Open-Meteo forecast integration
//!
//! Client for the Open-Meteo Weather API (<https://open-meteo.com>).
//! Serves as the keyless fallback forecast source.

pub mod client;
mod models;

pub use client::{OpenMeteoClient, OpenMeteoConfig, OpenMeteoError};
