//! Upstream data providers
//!
//! Geocoding and pollution lookups sit behind two async traits so the
//! orchestrator can be driven by any source, including test doubles.

pub mod openweathermap;
pub mod waqi;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, PollutionSource, SmokeWatchConfig};
use crate::models::{AqiSample, Coordinates, Location};
use crate::{Result, SmokeWatchError};

pub use openweathermap::OpenWeatherMapClient;
pub use waqi::WaqiClient;

/// Resolves a free-text place name to its best match
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// `Ok(None)` when nothing matched
    async fn geocode(&self, query: &str) -> Result<Option<Location>>;
}

/// Fetches the current air quality for a coordinate pair
#[async_trait]
pub trait PollutionProvider: Send + Sync {
    async fn air_quality(&self, coordinates: Coordinates) -> Result<AqiSample>;
}

/// Build the providers selected by configuration
pub fn from_config(
    config: &SmokeWatchConfig,
) -> Result<(Arc<dyn GeocodingProvider>, Arc<dyn PollutionProvider>)> {
    let client = http_client(&config.api)?;
    let openweathermap = Arc::new(OpenWeatherMapClient::new(client.clone(), &config.api)?);

    let pollution: Arc<dyn PollutionProvider> = match config.pollution.source {
        PollutionSource::OpenWeatherMap => Arc::clone(&openweathermap) as Arc<dyn PollutionProvider>,
        PollutionSource::Waqi => {
            let waqi = WaqiClient::new(client, &config.api, config.pollution.breakpoints)?;
            Arc::new(waqi) as Arc<dyn PollutionProvider>
        }
    };

    info!(source = ?config.pollution.source, "Configured pollution provider");
    let geocoder: Arc<dyn GeocodingProvider> = openweathermap;
    Ok((geocoder, pollution))
}

/// HTTP client shared by all providers
pub fn http_client(config: &ApiConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(concat!("SmokeWatch/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// GET `url` and return the body of a successful response.
///
/// `endpoint` is what gets logged; the URL carries credentials.
pub(crate) async fn fetch_body(
    client: &ClientWithMiddleware,
    url: &str,
    endpoint: &str,
) -> Result<String> {
    let start_time = Instant::now();
    debug!("Requesting {}", endpoint);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| redact(e, endpoint))?;
    let status = response.status();

    if !status.is_success() {
        warn!("{} returned HTTP {}", endpoint, status);
        return Err(SmokeWatchError::api(format!(
            "{endpoint} returned HTTP {status}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SmokeWatchError::from(e.without_url()))?;
    let duration = start_time.elapsed();

    info!(
        "{} answered in {:.3}s ({} bytes)",
        endpoint,
        duration.as_secs_f64(),
        body.len()
    );

    if duration.as_secs() > 5 {
        warn!("Slow API response detected: {:.3}s", duration.as_secs_f64());
    }

    Ok(body)
}

/// Drop the request URL from a client error; it carries the API key.
fn redact(err: reqwest_middleware::Error, endpoint: &str) -> SmokeWatchError {
    match err {
        reqwest_middleware::Error::Reqwest(e) => e.without_url().into(),
        _ => SmokeWatchError::api(format!("{endpoint} request failed after retries")),
    }
}
