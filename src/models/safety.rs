//! Safety score results for single locations and whole routes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Pollutant, PollutantDetail, WeatherType};

/// How a scored value came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Computed from upstream data
    Scored,
    /// Upstream had nothing to offer; the neutral value is expected
    NoData,
    /// An internal error was converted into the neutral value
    Failed,
}

/// Safety classification of a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    /// score >= 0.7
    Safe,
    /// score >= 0.4
    Moderate,
    /// score < 0.4
    Risky,
}

impl SafetyStatus {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.7 => SafetyStatus::Safe,
            s if s >= 0.4 => SafetyStatus::Moderate,
            _ => SafetyStatus::Risky,
        }
    }
}

/// Overall classification of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Safe,
    Moderate,
    Risky,
    /// The route could not be assessed
    Unknown,
}

impl RouteStatus {
    /// Classify a route from its unsafe waypoint count
    #[must_use]
    pub fn from_unsafe_count(unsafe_count: usize, total: usize) -> Self {
        if unsafe_count == 0 {
            RouteStatus::Safe
        } else if unsafe_count * 2 <= total {
            RouteStatus::Moderate
        } else {
            RouteStatus::Risky
        }
    }
}

/// Each factor's contribution to the score, as actually subtracted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ImpactBreakdown {
    pub weather_impact: f64,
    pub wind_impact: f64,
    pub precipitation_impact: f64,
    pub humidity_impact: f64,
    pub temperature_impact: f64,
    pub air_quality_impact: f64,
}

impl ImpactBreakdown {
    /// Sum of all applied impacts
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weather_impact
            + self.wind_impact
            + self.precipitation_impact
            + self.humidity_impact
            + self.temperature_impact
            + self.air_quality_impact
    }
}

/// Result of the air quality score aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityScore {
    pub outcome: Outcome,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the requested point to the station
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub safety_reduction: f64,
    pub warnings: Vec<String>,
    pub pollutants: BTreeMap<Pollutant, PollutantDetail>,
    pub data_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Air quality section embedded in location and waypoint results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySummary {
    pub available: bool,
    pub warnings: Vec<String>,
    pub pollutants: BTreeMap<Pollutant, PollutantDetail>,
    pub location: String,
}

impl From<&AirQualityScore> for AirQualitySummary {
    fn from(score: &AirQualityScore) -> Self {
        Self {
            available: score.data_available,
            warnings: score.warnings.clone(),
            pollutants: score.pollutants.clone(),
            location: score.location_name.clone(),
        }
    }
}

/// Safety score for a single location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyScoreResult {
    /// Score in [0.05, 1.0]
    pub safety_score: f64,
    pub outcome: Outcome,
    pub weather_type: WeatherType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQualitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ImpactBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SafetyScoreResult {
    /// Score used whenever weather data is missing or unusable
    pub const FALLBACK_SCORE: f64 = 0.5;

    /// Neutral result with the given outcome and explanation
    #[must_use]
    pub fn fallback(outcome: Outcome, error: impl Into<String>) -> Self {
        Self {
            safety_score: Self::FALLBACK_SCORE,
            outcome,
            weather_type: WeatherType::Unknown,
            weather_code: None,
            temperature: None,
            wind_speed: None,
            precipitation: None,
            humidity: None,
            air_quality: None,
            details: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn status(&self) -> SafetyStatus {
        SafetyStatus::from_score(self.safety_score)
    }
}

/// Per-waypoint entry of a route assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointSafety {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub safety_score: f64,
    pub status: SafetyStatus,
    pub weather_type: WeatherType,
    pub temperature: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQualitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ImpactBreakdown>,
}

/// Safety assessment of an ordered list of waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSafetyResult {
    pub waypoints: Vec<WaypointSafety>,
    pub average_safety: f64,
    pub unsafe_areas: Vec<WaypointSafety>,
    pub route_status: RouteStatus,
    pub unsafe_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteSafetyResult {
    /// Error-tagged result used when the route cannot be assessed
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            waypoints: Vec::new(),
            average_safety: SafetyScoreResult::FALLBACK_SCORE,
            unsafe_areas: Vec::new(),
            route_status: RouteStatus::Unknown,
            unsafe_count: 0,
            error: Some(error.into()),
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyStatus::Safe => write!(f, "SAFE"),
            SafetyStatus::Moderate => write!(f, "MODERATE"),
            SafetyStatus::Risky => write!(f, "RISKY"),
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteStatus::Safe => write!(f, "SAFE"),
            RouteStatus::Moderate => write!(f, "MODERATE"),
            RouteStatus::Risky => write!(f, "RISKY"),
            RouteStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
