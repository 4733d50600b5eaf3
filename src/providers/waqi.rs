//! World Air Quality Index (aqicn.org) client
//!
//! WAQI reports a continuous US-EPA style index (0-500) and per-pollutant
//! sub-indices under `iaqi`. The index is folded onto the 1-5 scale with
//! the configured breakpoints; pollutants WAQI does not report become 0.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{PollutionProvider, fetch_body};
use crate::aqi::AqiBreakpoints;
use crate::config::ApiConfig;
use crate::models::{AqiSample, Coordinates, Pollutant, Pollutants};
use crate::{Result, SmokeWatchError};

pub struct WaqiClient {
    client: ClientWithMiddleware,
    base_url: String,
    token: String,
    breakpoints: AqiBreakpoints,
}

impl WaqiClient {
    pub fn new(
        client: ClientWithMiddleware,
        config: &ApiConfig,
        breakpoints: AqiBreakpoints,
    ) -> Result<Self> {
        let token = config
            .waqi_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SmokeWatchError::config("WAQI token is not set"))?;

        Ok(Self {
            client,
            base_url: config.waqi_base_url.trim_end_matches('/').to_string(),
            token,
            breakpoints,
        })
    }

    fn feed_url(&self, coordinates: Coordinates) -> String {
        format!(
            "{}/feed/geo:{};{}/?token={}",
            self.base_url, coordinates.latitude, coordinates.longitude, self.token
        )
    }
}

#[async_trait]
impl PollutionProvider for WaqiClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn air_quality(&self, coordinates: Coordinates) -> Result<AqiSample> {
        let body = fetch_body(&self.client, &self.feed_url(coordinates), "waqi_feed").await?;
        parse_feed(&body, coordinates, &self.breakpoints)
    }
}

/// Translate a WAQI feed body into a sample
pub fn parse_feed(
    body: &str,
    coordinates: Coordinates,
    breakpoints: &AqiBreakpoints,
) -> Result<AqiSample> {
    let response: FeedResponse = serde_json::from_str(body)
        .map_err(|e| SmokeWatchError::api(format!("Invalid data received from WAQI: {e}")))?;

    if response.status != "ok" {
        let reason = match &response.data {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        return Err(SmokeWatchError::api(format!("WAQI request failed: {reason}")));
    }

    let feed: Feed = serde_json::from_value(response.data)
        .map_err(|e| SmokeWatchError::api(format!("Invalid feed received from WAQI: {e}")))?;

    // Stations without a current reading report "-"
    let index = match feed.aqi {
        FeedIndex::Value(value) => value,
        FeedIndex::Missing(marker) => {
            return Err(SmokeWatchError::api(format!(
                "WAQI has no current reading for {} ({marker})",
                coordinates.format()
            )));
        }
    };

    let aqi_index = breakpoints.bucket(index);
    debug!("WAQI index {} bucketed to {}", index, aqi_index);

    let mut pollutants = Pollutants::default();
    for (symbol, reading) in &feed.iaqi {
        if let Some(pollutant) = pollutant_for(symbol) {
            pollutants.set(pollutant, reading.v);
        }
    }

    let observed_at = feed
        .time
        .and_then(|time| time.v)
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    Ok(AqiSample {
        aqi_index,
        pollutants,
        observed_at,
        coordinates,
    })
}

fn pollutant_for(symbol: &str) -> Option<Pollutant> {
    match symbol {
        "co" => Some(Pollutant::Co),
        "no2" => Some(Pollutant::No2),
        "o3" => Some(Pollutant::O3),
        "so2" => Some(Pollutant::So2),
        "pm25" => Some(Pollutant::Pm25),
        "pm10" => Some(Pollutant::Pm10),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct Feed {
    aqi: FeedIndex,
    #[serde(default)]
    iaqi: HashMap<String, Reading>,
    time: Option<FeedTime>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedIndex {
    Value(f64),
    Missing(String),
}

#[derive(Debug, Deserialize)]
struct Reading {
    v: f64,
}

#[derive(Debug, Deserialize)]
struct FeedTime {
    v: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEIJING_FEED: &str = r#"{
        "status": "ok",
        "data": {
            "aqi": 158,
            "idx": 1451,
            "city": {"geo": [39.954592, 116.468117], "name": "Beijing"},
            "iaqi": {
                "co": {"v": 9.1},
                "h": {"v": 45},
                "no2": {"v": 21.5},
                "o3": {"v": 3.2},
                "pm10": {"v": 71},
                "pm25": {"v": 158},
                "so2": {"v": 2.1},
                "t": {"v": 12}
            },
            "time": {"s": "2024-01-15 12:00:00", "tz": "+08:00", "v": 1705320000}
        }
    }"#;

    fn beijing() -> Coordinates {
        Coordinates::new(39.9546, 116.4681)
    }

    #[test]
    fn test_feed_is_bucketed_and_mapped() {
        let sample = parse_feed(BEIJING_FEED, beijing(), &AqiBreakpoints::default()).unwrap();

        assert_eq!(sample.aqi_index, 3);
        assert_eq!(sample.pollutants.pm2_5, 158.0);
        assert_eq!(sample.pollutants.pm10, 71.0);
        assert_eq!(sample.pollutants.co, 9.1);
        assert_eq!(sample.pollutants.no, 0.0);
        assert_eq!(sample.pollutants.nh3, 0.0);
        assert_eq!(sample.observed_at, 1_705_320_000);
        assert_eq!(sample.coordinates, beijing());
    }

    #[test]
    fn test_custom_breakpoints_apply() {
        let strict = AqiBreakpoints {
            good_max: 10.0,
            moderate_max: 20.0,
            sensitive_max: 40.0,
            unhealthy_max: 80.0,
        };
        let sample = parse_feed(BEIJING_FEED, beijing(), &strict).unwrap();
        assert_eq!(sample.aqi_index, 5);
    }

    #[test]
    fn test_error_status_is_api_error() {
        let body = r#"{"status": "error", "data": "Invalid key"}"#;
        let err = parse_feed(body, beijing(), &AqiBreakpoints::default()).unwrap_err();
        assert!(matches!(err, SmokeWatchError::Api { .. }));
        assert!(err.to_string().contains("Invalid key"));
    }

    #[test]
    fn test_missing_reading_is_api_error() {
        let body = r#"{"status": "ok", "data": {"aqi": "-", "iaqi": {}}}"#;
        let err = parse_feed(body, beijing(), &AqiBreakpoints::default()).unwrap_err();
        assert!(err.to_string().contains("no current reading"));
    }

    #[test]
    fn test_sparse_feed_defaults() {
        let body = r#"{"status": "ok", "data": {"aqi": 42}}"#;
        let sample = parse_feed(body, beijing(), &AqiBreakpoints::default()).unwrap();
        assert_eq!(sample.aqi_index, 1);
        assert_eq!(sample.pollutants, Pollutants::default());
        assert!(sample.observed_at > 0);
    }
}
