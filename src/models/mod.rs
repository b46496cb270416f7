//! Data models for the SafeSafar service
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, cache keys and route waypoints
//! - Weather: current conditions and WMO code interpretation
//! - Air quality: station records, pollutants and impact results
//! - Safety: location and route score results

pub mod air_quality;
pub mod location;
pub mod safety;
pub mod weather;

// Re-export all public types for convenient access
pub use air_quality::{
    AirQualityRecord, AqiCategory, Pollutant, PollutantDetail, PollutantReading, SafetyImpact,
};
pub use location::{Coordinate, Waypoint};
pub use safety::{
    AirQualityScore, AirQualitySummary, ImpactBreakdown, Outcome, RouteSafetyResult, RouteStatus,
    SafetyScoreResult, SafetyStatus, WaypointSafety,
};
pub use weather::{WeatherSnapshot, WeatherType};
