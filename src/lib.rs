//! `SmokeWatch` - city air quality with a cigarette-equivalent metaphor
//!
//! This library geocodes a city name, fetches the air quality for the
//! resulting coordinates, and derives display metrics from the AQI index
//! and PM2.5 concentration.

pub mod aqi;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod report;
pub mod web;

// Re-export core types for public API
pub use aqi::{AqiBreakpoints, AqiColor};
pub use config::SmokeWatchConfig;
pub use error::SmokeWatchError;
pub use models::{AqiSample, Coordinates, Location, Pollutant, Pollutants};
pub use orchestrator::{AirQualityOrchestrator, ResourceStatus, SearchOutcome, SearchState};
pub use providers::{GeocodingProvider, PollutionProvider};
pub use report::{AirQualityReport, SearchView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SmokeWatchError>;
