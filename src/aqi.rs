//! Air quality index metrics
//!
//! Pure lookups from the 1-5 AQI index to display categories, plus the
//! PM2.5 "cigarette equivalent". Every function is total: indices outside
//! 1-5 fall into the hazardous bucket instead of failing.

use serde::{Deserialize, Serialize};

/// PM2.5 concentration (µg/m³, 24h exposure) equivalent to one cigarette
pub const PM25_PER_CIGARETTE: f64 = 22.0;

/// Color category used by presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AqiColor {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiColor {
    /// Stable style token for this category
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            AqiColor::Good => "aqi-good",
            AqiColor::Moderate => "aqi-moderate",
            AqiColor::Unhealthy => "aqi-unhealthy",
            AqiColor::VeryUnhealthy => "aqi-veryunhealthy",
            AqiColor::Hazardous => "aqi-hazardous",
        }
    }
}

/// Category label for an AQI index
#[must_use]
pub fn category_label(aqi_index: i32) -> &'static str {
    match aqi_index {
        1 => "Good",
        2 => "Moderate",
        3 => "Unhealthy for Sensitive Groups",
        4 => "Unhealthy",
        5 => "Very Unhealthy",
        _ => "Hazardous",
    }
}

/// Color category for an AQI index
#[must_use]
pub fn color_category(aqi_index: i32) -> AqiColor {
    match aqi_index {
        1 => AqiColor::Good,
        2 => AqiColor::Moderate,
        3 => AqiColor::Unhealthy,
        4 => AqiColor::VeryUnhealthy,
        _ => AqiColor::Hazardous,
    }
}

/// Health impact narrative for an AQI index
#[must_use]
pub fn health_impact_text(aqi_index: i32) -> &'static str {
    match aqi_index {
        1 => "Air quality is considered satisfactory, and air pollution poses little or no risk.",
        2 => {
            "Air quality is acceptable; however, there may be a moderate health concern for a very small number of people."
        }
        3 => {
            "Members of sensitive groups may experience health effects. The general public is not likely to be affected."
        }
        4 => {
            "Everyone may begin to experience health effects; members of sensitive groups may experience more serious health effects."
        }
        5 => {
            "Health warnings of emergency conditions. The entire population is more likely to be affected."
        }
        _ => "Health alert: everyone may experience more serious health effects.",
    }
}

/// Number of cigarettes whose smoke matches 24h of breathing `pm25`.
///
/// Rounded to one decimal, ties toward positive infinity. Input is not
/// clamped, so negative concentrations give negative counts.
#[must_use]
pub fn cigarette_equivalent(pm25: f64) -> f64 {
    round_half_up(pm25 / PM25_PER_CIGARETTE * 10.0) / 10.0
}

fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Thresholds for folding a continuous (0-500 style) index into 1-5.
///
/// A value strictly above a threshold lands in the next bucket up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AqiBreakpoints {
    #[serde(default = "default_good_max")]
    pub good_max: f64,
    #[serde(default = "default_moderate_max")]
    pub moderate_max: f64,
    #[serde(default = "default_sensitive_max")]
    pub sensitive_max: f64,
    #[serde(default = "default_unhealthy_max")]
    pub unhealthy_max: f64,
}

fn default_good_max() -> f64 {
    50.0
}

fn default_moderate_max() -> f64 {
    100.0
}

fn default_sensitive_max() -> f64 {
    200.0
}

fn default_unhealthy_max() -> f64 {
    300.0
}

impl Default for AqiBreakpoints {
    fn default() -> Self {
        Self {
            good_max: default_good_max(),
            moderate_max: default_moderate_max(),
            sensitive_max: default_sensitive_max(),
            unhealthy_max: default_unhealthy_max(),
        }
    }
}

impl AqiBreakpoints {
    /// Map a continuous index onto the 1-5 scale
    #[must_use]
    pub fn bucket(&self, value: f64) -> i32 {
        if value > self.unhealthy_max {
            5
        } else if value > self.sensitive_max {
            4
        } else if value > self.moderate_max {
            3
        } else if value > self.good_max {
            2
        } else {
            1
        }
    }

    /// Thresholds must be strictly increasing
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.good_max < self.moderate_max
            && self.moderate_max < self.sensitive_max
            && self.sensitive_max < self.unhealthy_max
    }
}
