//! OpenWeatherMap geocoding and air pollution client
//!
//! - `/geo/1.0/direct?q=<name>&limit=1` returns an array of candidate
//!   places; we keep the first.
//! - `/data/2.5/air_pollution?lat=<lat>&lon=<lon>` returns `list[]`, each
//!   entry holding `main.aqi` (1-5), `components` in µg/m³ and `dt`.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{GeocodingProvider, PollutionProvider, fetch_body};
use crate::config::ApiConfig;
use crate::models::{AqiSample, Coordinates, Location, Pollutants};
use crate::{Result, SmokeWatchError};

pub struct OpenWeatherMapClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(client: ClientWithMiddleware, config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .openweathermap_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SmokeWatchError::config("OpenWeatherMap API key is not set"))?;

        Ok(Self {
            client,
            base_url: config.openweathermap_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn geocoding_url(&self, query: &str) -> String {
        format!(
            "{}/geo/1.0/direct?q={}&limit=1&appid={}",
            self.base_url,
            urlencoding::encode(query),
            self.api_key
        )
    }

    fn air_pollution_url(&self, coordinates: Coordinates) -> String {
        format!(
            "{}/data/2.5/air_pollution?lat={}&lon={}&appid={}",
            self.base_url, coordinates.latitude, coordinates.longitude, self.api_key
        )
    }
}

#[async_trait]
impl GeocodingProvider for OpenWeatherMapClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        let body = fetch_body(&self.client, &self.geocoding_url(query), "geocoding").await?;
        let location = parse_geocoding(&body)?;

        match &location {
            Some(found) => info!(
                "Geocoded '{}' to {} ({})",
                query,
                found.display_name(),
                found.coordinates.format()
            ),
            None => warn!("No results found for location '{}'", query),
        }

        Ok(location)
    }
}

#[async_trait]
impl PollutionProvider for OpenWeatherMapClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn air_quality(&self, coordinates: Coordinates) -> Result<AqiSample> {
        let body = fetch_body(
            &self.client,
            &self.air_pollution_url(coordinates),
            "air_pollution",
        )
        .await?;
        parse_air_pollution(&body, coordinates)
    }
}

/// Best match from a geocoding response body
pub fn parse_geocoding(body: &str) -> Result<Option<Location>> {
    let results: Vec<GeocodingResult> = serde_json::from_str(body).map_err(|e| {
        SmokeWatchError::api(format!("Invalid geocoding data received from OpenWeatherMap: {e}"))
    })?;

    Ok(results.into_iter().next().map(Location::from))
}

/// First sample from an air pollution response body
pub fn parse_air_pollution(body: &str, coordinates: Coordinates) -> Result<AqiSample> {
    let response: AirPollutionResponse = serde_json::from_str(body).map_err(|e| {
        SmokeWatchError::api(format!(
            "Invalid air pollution data received from OpenWeatherMap: {e}"
        ))
    })?;

    let entry = response.list.into_iter().next().ok_or_else(|| {
        SmokeWatchError::api(format!(
            "No air pollution samples for {}",
            coordinates.format()
        ))
    })?;

    Ok(AqiSample {
        aqi_index: entry.main.aqi,
        pollutants: entry.components,
        observed_at: entry.dt,
        coordinates,
    })
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        Location {
            name: result.name,
            country: result.country,
            state: result.state,
            coordinates: Coordinates::new(result.lat, result.lon),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    main: AirPollutionMain,
    #[serde(default)]
    components: Pollutants,
    #[serde(default)]
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct AirPollutionMain {
    aqi: i32,
}
