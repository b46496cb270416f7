//! Air quality models: station records, pollutant readings and impact results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Coordinate;

/// Station name used when the provider does not report one
pub const UNKNOWN_STATION: &str = "Unknown Station";

/// Pollutants reported by monitoring stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    O3,
    So2,
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// Parameter name as used by the providers
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One measured concentration (μg/m³ for particulates, ppb for gases)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub parameter: Pollutant,
    pub value: f64,
}

/// Nearest-station record from the air quality provider.
///
/// Cached in memory; the fallback variant (`data_available == false`) is a
/// valid state and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityRecord {
    pub location_name: String,
    pub station: Coordinate,
    pub readings: Vec<PollutantReading>,
    /// Overall station AQI, when the station publishes one
    pub aqi: Option<f64>,
    pub dominant_pollutant: Option<String>,
    /// Observation time reported by the station
    pub observed_at: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub data_available: bool,
    pub message: Option<String>,
}

impl AirQualityRecord {
    /// Fallback record used whenever the provider cannot deliver data
    #[must_use]
    pub fn unavailable(requested: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            location_name: UNKNOWN_STATION.to_string(),
            station: requested,
            readings: Vec::new(),
            aqi: None,
            dominant_pollutant: None,
            observed_at: None,
            last_updated: now,
            data_available: false,
            message: Some("WAQI data unavailable".to_string()),
        }
    }

    /// True when there is something to score
    #[must_use]
    pub fn has_measurements(&self) -> bool {
        self.data_available && (!self.readings.is_empty() || self.aqi.is_some())
    }
}

/// AQI severity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AqiCategory::Good => "good",
            AqiCategory::Moderate => "moderate",
            AqiCategory::UnhealthySensitive => "unhealthy_sensitive",
            AqiCategory::Unhealthy => "unhealthy",
            AqiCategory::VeryUnhealthy => "very_unhealthy",
            AqiCategory::Hazardous => "hazardous",
            AqiCategory::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Per-pollutant entry of the impact breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantDetail {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AqiCategory>,
}

impl PollutantDetail {
    #[must_use]
    pub fn value(value: f64) -> Self {
        Self {
            value,
            aqi: None,
            category: None,
        }
    }
}

/// Result of the pollutant safety-impact calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SafetyImpact {
    /// Fraction to subtract from a perfect score, in [0, 0.85]
    pub safety_reduction: f64,
    pub details: BTreeMap<Pollutant, PollutantDetail>,
    pub warnings: Vec<String>,
    pub air_quality_impact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SafetyImpact {
    /// Zero-impact result annotated with the internal error that produced it
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
