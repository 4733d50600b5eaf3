//! City search orchestration
//!
//! A search runs two stages: geocode the city name, then fetch air quality
//! for the resulting coordinates. Each stage is tracked as its own
//! resource. Searches may overlap; every search takes a generation number
//! when it starts and a result is only applied while its generation is
//! still the latest, so the most recently *initiated* search always wins.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{TtlCache, jittered};
use crate::config::{CacheConfig, SmokeWatchConfig};
use crate::models::{AqiSample, CoordinateKey, Coordinates, Location};
use crate::providers::{self, GeocodingProvider, PollutionProvider};
use crate::{Result, SmokeWatchError};

/// Progress of one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    /// Geocoding matched nothing. Expected and user-correctable.
    NotFound,
    /// Network or upstream failure, scoped to this search
    Failed { reason: String },
}

/// Flags a presentation layer renders from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusFlags {
    pub geocode_loading: bool,
    pub geocode_error: bool,
    pub not_found: bool,
    pub pollution_loading: bool,
    pub pollution_error: bool,
}

/// Everything the orchestrator exposes about the current search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    /// Bumped whenever a search starts
    pub generation: u64,
    /// Trimmed query of the latest search
    pub query: Option<String>,
    pub location: Option<Location>,
    /// Always measured at `location`'s coordinates
    pub sample: Option<AqiSample>,
    pub geocode: ResourceStatus,
    pub pollution: ResourceStatus,
}

impl SearchState {
    #[must_use]
    pub fn flags(&self) -> StatusFlags {
        StatusFlags {
            geocode_loading: self.geocode == ResourceStatus::Loading,
            geocode_error: matches!(self.geocode, ResourceStatus::Failed { .. }),
            not_found: self.geocode == ResourceStatus::NotFound,
            pollution_loading: self.pollution == ResourceStatus::Loading,
            pollution_error: matches!(self.pollution, ResourceStatus::Failed { .. }),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        let flags = self.flags();
        flags.geocode_loading || flags.pollution_loading
    }
}

/// What a single `search_city` call ended with
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank input; nothing was requested
    Ignored,
    Found { location: Location, sample: AqiSample },
    NotFound,
    GeocodeFailed { reason: String },
    PollutionFailed { location: Location, reason: String },
    /// A newer search started before this one finished; its results were dropped
    Superseded,
}

pub struct AirQualityOrchestrator {
    geocoder: Arc<dyn GeocodingProvider>,
    pollution: Arc<dyn PollutionProvider>,
    geocode_cache: Option<TtlCache<String, Location>>,
    pollution_cache: Option<TtlCache<CoordinateKey, AqiSample>>,
    geocode_ttl: Duration,
    pollution_ttl: Duration,
    state: watch::Sender<SearchState>,
}

impl AirQualityOrchestrator {
    /// Orchestrator with the default cache settings
    pub fn new(geocoder: Arc<dyn GeocodingProvider>, pollution: Arc<dyn PollutionProvider>) -> Self {
        Self::with_cache_config(geocoder, pollution, &CacheConfig::default())
    }

    pub fn with_cache_config(
        geocoder: Arc<dyn GeocodingProvider>,
        pollution: Arc<dyn PollutionProvider>,
        cache: &CacheConfig,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());

        Self {
            geocoder,
            pollution,
            geocode_cache: cache.enabled.then(TtlCache::new),
            pollution_cache: cache.enabled.then(TtlCache::new),
            geocode_ttl: Duration::from_secs(u64::from(cache.geocode_ttl_minutes) * 60),
            pollution_ttl: Duration::from_secs(u64::from(cache.pollution_ttl_minutes) * 60),
            state,
        }
    }

    /// Wire up the configured upstream providers
    pub fn from_config(config: &SmokeWatchConfig) -> Result<Self> {
        let (geocoder, pollution) = providers::from_config(config)?;
        Ok(Self::with_cache_config(geocoder, pollution, &config.cache))
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Look up the air quality for a city.
    ///
    /// Failures never escape: they end up in the returned outcome and in
    /// the stage flags of [`SearchState`].
    #[instrument(skip(self))]
    pub async fn search_city(&self, city_name: &str) -> SearchOutcome {
        let query = city_name.trim();
        if query.is_empty() {
            debug!("Ignoring blank search");
            return SearchOutcome::Ignored;
        }

        let ticket = self.begin(query);

        let location = match self.resolve_location(query).await {
            Ok(Some(location)) => location,
            Ok(None) => {
                warn!("City '{}' not found", query);
                return self.finish(ticket, SearchOutcome::NotFound, |state| {
                    state.geocode = ResourceStatus::NotFound;
                });
            }
            Err(err) => {
                log_failure("Geocoding", query, &err);
                let reason = err.user_message();
                return self.finish(
                    ticket,
                    SearchOutcome::GeocodeFailed {
                        reason: reason.clone(),
                    },
                    |state| state.geocode = ResourceStatus::Failed { reason },
                );
            }
        };

        let selected = location.clone();
        let still_current = self.commit(ticket, |state| {
            state.location = Some(selected);
            state.sample = None;
            state.geocode = ResourceStatus::Succeeded;
            state.pollution = ResourceStatus::Loading;
        });
        if !still_current {
            debug!("Search for '{}' superseded after geocoding", query);
            return SearchOutcome::Superseded;
        }

        match self.resolve_sample(location.coordinates).await {
            Ok(sample) => {
                info!(
                    "AQI {} for {}",
                    sample.aqi_index,
                    location.display_name()
                );
                let stored = sample.clone();
                self.finish(ticket, SearchOutcome::Found { location, sample }, |state| {
                    state.sample = Some(stored);
                    state.pollution = ResourceStatus::Succeeded;
                })
            }
            Err(err) => {
                log_failure("Air quality lookup", query, &err);
                let reason = err.user_message();
                self.finish(
                    ticket,
                    SearchOutcome::PollutionFailed {
                        location,
                        reason: reason.clone(),
                    },
                    |state| state.pollution = ResourceStatus::Failed { reason },
                )
            }
        }
    }

    /// Start a new generation. The last good location/sample pair stays
    /// visible until this search replaces it.
    fn begin(&self, query: &str) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            ticket = state.generation;
            state.query = Some(query.to_string());
            state.geocode = ResourceStatus::Loading;
            state.pollution = ResourceStatus::Idle;
        });
        ticket
    }

    /// Apply `update` only if no newer search has started
    fn commit(&self, ticket: u64, update: impl FnOnce(&mut SearchState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != ticket {
                return false;
            }
            update(state);
            true
        })
    }

    fn finish(
        &self,
        ticket: u64,
        outcome: SearchOutcome,
        update: impl FnOnce(&mut SearchState),
    ) -> SearchOutcome {
        if self.commit(ticket, update) {
            outcome
        } else {
            debug!("Dropping stale result of search #{}", ticket);
            SearchOutcome::Superseded
        }
    }

    async fn resolve_location(&self, query: &str) -> Result<Option<Location>> {
        let key = normalize_query(query);

        if let Some(hit) = self.geocode_cache.as_ref().and_then(|cache| cache.get(&key)) {
            debug!("Geocode cache hit for '{}'", key);
            return Ok(Some(hit));
        }

        let location = self.geocoder.geocode(query).await?;

        if let (Some(cache), Some(found)) = (&self.geocode_cache, &location) {
            cache.put(key, found.clone(), jittered(self.geocode_ttl));
        }

        Ok(location)
    }

    async fn resolve_sample(&self, coordinates: Coordinates) -> Result<AqiSample> {
        let key = coordinates.cache_key();

        if let Some(hit) = self.pollution_cache.as_ref().and_then(|cache| cache.get(&key)) {
            debug!("Pollution cache hit for {}", coordinates.format());
            return Ok(hit);
        }

        let sample = self.pollution.air_quality(coordinates).await?;

        if let Some(cache) = &self.pollution_cache {
            cache.put(key, sample.clone(), jittered(self.pollution_ttl));
        }

        Ok(sample)
    }
}

fn log_failure(stage: &str, query: &str, err: &SmokeWatchError) {
    if err.is_transport() {
        warn!("{} for '{}' failed: {}", stage, query, err);
    } else {
        error!("{} for '{}' failed: {}", stage, query, err);
    }
}

/// Cache key for a city query: case and whitespace insensitive
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
