//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Cache key for this exact coordinate pair
    #[must_use]
    pub fn cache_key(&self) -> CoordinateKey {
        CoordinateKey::new(*self)
    }
}

/// Hashable form of a coordinate pair, in micro-degrees
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CoordinateKey {
    pub lat_micro: i64,
    pub lon_micro: i64,
}

impl CoordinateKey {
    #[must_use]
    pub fn new(coordinates: Coordinates) -> Self {
        // Valid coordinates are well inside i64 range once scaled
        let lat_micro = (coordinates.latitude * 1_000_000.0).round();
        let lon_micro = (coordinates.longitude * 1_000_000.0).round();

        Self {
            lat_micro: lat_micro as i64,
            lon_micro: lon_micro as i64,
        }
    }
}

/// A geocoded place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Place name (city, town, etc.)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: String,
    /// State or region, when the geocoder knows one
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(name: impl Into<String>, country: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            state: None,
            coordinates,
        }
    }

    /// Attach a state or region
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// "Name, State, Country" with the state left out when unknown
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let london = Location::new("London", "GB", Coordinates::new(51.51, -0.13));
        assert_eq!(london.display_name(), "London, GB");

        let springfield =
            Location::new("Springfield", "US", Coordinates::new(39.8, -89.65)).with_state("Illinois");
        assert_eq!(springfield.display_name(), "Springfield, Illinois, US");
    }

    #[test]
    fn test_coordinate_key() {
        let key = Coordinates::new(45.123_456, -6.789_123).cache_key();
        assert_eq!(key.lat_micro, 45_123_456);
        assert_eq!(key.lon_micro, -6_789_123);
    }

    #[test]
    fn test_coordinate_key_distinguishes_nearby_points() {
        let a = Coordinates::new(51.5074, -0.1278).cache_key();
        let b = Coordinates::new(51.5075, -0.1278).cache_key();
        assert_ne!(a, b);
        assert_eq!(a, Coordinates::new(51.5074, -0.1278).cache_key());
    }

    #[test]
    fn test_format_coordinates() {
        let coordinates = Coordinates::new(46.818_234, 8.227_456);
        assert_eq!(coordinates.format(), "46.8182, 8.2275");
    }
}
