//! Data models for the SmokeWatch service
//!
//! - Location: geocoded places and coordinate pairs
//! - Air quality: AQI samples and pollutant concentrations

pub mod air_quality;
pub mod location;

pub use air_quality::{AqiSample, Pollutant, Pollutants};
pub use location::{CoordinateKey, Coordinates, Location};
