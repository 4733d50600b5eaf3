//! Shared stub providers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use smoke_watch::{
    AirQualityOrchestrator, AqiSample, Coordinates, GeocodingProvider, Location, Pollutants,
    PollutionProvider, Result,
};

/// Geocoder answering from a fixed table keyed by query
#[derive(Default)]
pub struct TableGeocoder {
    places: HashMap<String, Location>,
    delays: HashMap<String, Duration>,
    pub calls: AtomicUsize,
}

impl TableGeocoder {
    pub fn with(mut self, query: &str, location: Location) -> Self {
        self.places.insert(query.to_string(), location);
        self
    }

    /// Answer `query` only after `delay`
    pub fn slow(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }
}

#[async_trait]
impl GeocodingProvider for TableGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.places.get(query).cloned())
    }
}

/// Pollution source returning one fixed reading for any coordinates
pub struct FixedPollution {
    pub aqi_index: i32,
    pub pollutants: Pollutants,
    pub calls: AtomicUsize,
}

impl FixedPollution {
    pub fn new(aqi_index: i32, pollutants: Pollutants) -> Self {
        Self {
            aqi_index,
            pollutants,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PollutionProvider for FixedPollution {
    async fn air_quality(&self, coordinates: Coordinates) -> Result<AqiSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AqiSample {
            aqi_index: self.aqi_index,
            pollutants: self.pollutants,
            observed_at: 1_700_000_000,
            coordinates,
        })
    }
}

pub fn london() -> Location {
    Location::new("London", "GB", Coordinates::new(51.51, -0.13))
}

pub fn paris() -> Location {
    Location::new("Paris", "FR", Coordinates::new(48.8566, 2.3522))
}

pub fn tokyo() -> Location {
    Location::new("Tokyo", "JP", Coordinates::new(35.6762, 139.6503))
}

pub fn london_pollutants() -> Pollutants {
    Pollutants {
        co: 230.31,
        no: 0.43,
        no2: 17.82,
        o3: 52.93,
        so2: 4.11,
        pm2_5: 18.4,
        pm10: 22.05,
        nh3: 0.72,
    }
}

/// Orchestrator that knows London only, reporting AQI 2
pub fn london_orchestrator() -> (
    AirQualityOrchestrator,
    Arc<TableGeocoder>,
    Arc<FixedPollution>,
) {
    let geocoder = Arc::new(TableGeocoder::default().with("London", london()));
    let pollution = Arc::new(FixedPollution::new(2, london_pollutants()));
    let orchestrator = AirQualityOrchestrator::new(geocoder.clone(), pollution.clone());
    (orchestrator, geocoder, pollution)
}
