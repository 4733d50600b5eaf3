//! Display-ready view of a search
//!
//! Combines the orchestrator's state with the AQI metrics. This is the
//! only place where display text is derived.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aqi::{self, AqiColor};
use crate::models::{AqiSample, Location, Pollutant};
use crate::orchestrator::{ResourceStatus, SearchOutcome, SearchState, StatusFlags};

/// Metrics derived from one location/sample pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReport {
    pub location: Location,
    pub display_name: String,
    pub aqi_index: i32,
    pub category_label: &'static str,
    pub color: AqiColor,
    pub color_token: &'static str,
    pub health_impact: &'static str,
    pub pm2_5: f64,
    pub cigarettes: f64,
    pub pollutants: Vec<PollutantReading>,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub symbol: &'static str,
    pub concentration: f64,
}

impl AirQualityReport {
    #[must_use]
    pub fn new(location: &Location, sample: &AqiSample) -> Self {
        let color = aqi::color_category(sample.aqi_index);

        Self {
            location: location.clone(),
            display_name: location.display_name(),
            aqi_index: sample.aqi_index,
            category_label: aqi::category_label(sample.aqi_index),
            color,
            color_token: color.token(),
            health_impact: aqi::health_impact_text(sample.aqi_index),
            pm2_5: sample.pm2_5(),
            cigarettes: aqi::cigarette_equivalent(sample.pm2_5()),
            pollutants: sample
                .pollutants
                .iter()
                .map(|(pollutant, concentration)| PollutantReading {
                    pollutant,
                    symbol: pollutant.symbol(),
                    concentration,
                })
                .collect(),
            observed_at: sample.observed_at_utc(),
        }
    }
}

/// What a client renders for the current search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchView {
    pub query: Option<String>,
    pub loading: bool,
    pub flags: StatusFlags,
    /// Non-blocking notification for the latest failure, if any
    pub notice: Option<String>,
    pub report: Option<AirQualityReport>,
    /// A newer search replaced this one before it finished
    pub superseded: bool,
}

impl SearchView {
    #[must_use]
    pub fn from_state(state: &SearchState) -> Self {
        let report = match (&state.location, &state.sample) {
            (Some(location), Some(sample)) => Some(AirQualityReport::new(location, sample)),
            _ => None,
        };

        Self {
            query: state.query.clone(),
            loading: state.is_loading(),
            flags: state.flags(),
            notice: notice(state),
            report,
            superseded: false,
        }
    }

    /// View of one caller's own search, independent of whatever other
    /// searches did to the shared state meanwhile.
    #[must_use]
    pub fn from_outcome(query: &str, outcome: &SearchOutcome) -> Self {
        let query = query.trim();
        let mut state = SearchState {
            query: (!query.is_empty()).then(|| query.to_string()),
            ..SearchState::default()
        };

        match outcome {
            SearchOutcome::Ignored | SearchOutcome::Superseded => {}
            SearchOutcome::Found { location, sample } => {
                state.location = Some(location.clone());
                state.sample = Some(sample.clone());
                state.geocode = ResourceStatus::Succeeded;
                state.pollution = ResourceStatus::Succeeded;
            }
            SearchOutcome::NotFound => state.geocode = ResourceStatus::NotFound,
            SearchOutcome::GeocodeFailed { reason } => {
                state.geocode = ResourceStatus::Failed {
                    reason: reason.clone(),
                };
            }
            SearchOutcome::PollutionFailed { location, reason } => {
                state.location = Some(location.clone());
                state.geocode = ResourceStatus::Succeeded;
                state.pollution = ResourceStatus::Failed {
                    reason: reason.clone(),
                };
            }
        }

        Self {
            superseded: *outcome == SearchOutcome::Superseded,
            ..Self::from_state(&state)
        }
    }
}

fn notice(state: &SearchState) -> Option<String> {
    match (&state.geocode, &state.pollution) {
        (ResourceStatus::NotFound, _) => Some(format!(
            "City \"{}\" not found",
            state.query.as_deref().unwrap_or_default()
        )),
        (ResourceStatus::Failed { .. }, _) => Some("Error fetching city coordinates".to_string()),
        (_, ResourceStatus::Failed { .. }) => Some("Error fetching air pollution data".to_string()),
        _ => None,
    }
}
