//! Safety Score Engine
//!
//! Combines current weather conditions and nearby air quality into a single
//! score in `[0.05, 1.0]`. Each factor maps its raw value onto a base impact
//! through a threshold table; the weighted impacts are subtracted from a
//! perfect score.

use tracing::{debug, info, instrument, warn};

use crate::air_quality::AirQualityScorer;
use crate::models::weather::interpret_weather_code;
use crate::models::{
    AirQualitySummary, Coordinate, ImpactBreakdown, Outcome, SafetyScoreResult, WeatherSnapshot,
    WeatherType,
};
use crate::weather::WeatherService;

/// Lowest score ever reported
pub const MIN_SCORE: f64 = 0.05;
/// Highest score ever reported
pub const MAX_SCORE: f64 = 1.0;

// Weight applied to each factor's base impact
pub const WEATHER_WEIGHT: f64 = 0.55;
pub const WIND_WEIGHT: f64 = 0.35;
pub const PRECIPITATION_WEIGHT: f64 = 0.25;
pub const HUMIDITY_WEIGHT: f64 = 0.15;
pub const TEMPERATURE_WEIGHT: f64 = 1.0;
pub const AIR_QUALITY_WEIGHT: f64 = 0.45;

/// Wind speed (km/h) impact
#[must_use]
pub fn wind_impact(wind_speed: f64) -> f64 {
    match wind_speed {
        w if w > 40.0 => 0.4,
        w if w > 20.0 => 0.2,
        w if w > 10.0 => 0.1,
        _ => 0.0,
    }
}

/// Precipitation (mm) impact
#[must_use]
pub fn precipitation_impact(precipitation: f64) -> f64 {
    match precipitation {
        p if p > 5.0 => 0.4,
        p if p > 2.0 => 0.25,
        p if p > 0.5 => 0.1,
        _ => 0.0,
    }
}

/// Relative humidity (%) impact
#[must_use]
pub fn humidity_impact(humidity: f64) -> f64 {
    match humidity {
        h if h > 95.0 => 0.15,
        h if h > 85.0 => 0.08,
        _ => 0.0,
    }
}

/// Temperature (°C) impact; the widest band that excludes the value wins
#[must_use]
pub fn temperature_impact(temperature: f64) -> f64 {
    let outside = |low: f64, high: f64| temperature < low || temperature > high;
    if outside(-10.0, 45.0) {
        0.2
    } else if outside(0.0, 35.0) {
        0.1
    } else if outside(5.0, 30.0) {
        0.05
    } else {
        0.0
    }
}

/// Score a weather snapshot together with an air quality reduction.
///
/// Returns the clamped score and the weighted impacts that were subtracted.
/// The breakdown always sums to `1 - unclamped score`.
#[must_use]
pub fn compute_score(
    snapshot: &WeatherSnapshot,
    air_quality_reduction: f64,
) -> (f64, WeatherType, ImpactBreakdown) {
    let (weather_type, base_impact) = interpret_weather_code(snapshot.weather_code);

    let breakdown = ImpactBreakdown {
        weather_impact: base_impact * WEATHER_WEIGHT,
        wind_impact: wind_impact(snapshot.wind_speed) * WIND_WEIGHT,
        precipitation_impact: precipitation_impact(snapshot.precipitation) * PRECIPITATION_WEIGHT,
        humidity_impact: humidity_impact(snapshot.humidity) * HUMIDITY_WEIGHT,
        temperature_impact: temperature_impact(snapshot.temperature) * TEMPERATURE_WEIGHT,
        air_quality_impact: air_quality_reduction * AIR_QUALITY_WEIGHT,
    };

    let score = (MAX_SCORE - breakdown.total()).clamp(MIN_SCORE, MAX_SCORE);
    (score, weather_type, breakdown)
}

/// Scores single locations from cached weather and air quality lookups
pub struct SafetyScorer {
    weather: WeatherService,
    air_quality: AirQualityScorer,
}

impl SafetyScorer {
    pub fn new(weather: WeatherService, air_quality: AirQualityScorer) -> Self {
        Self {
            weather,
            air_quality,
        }
    }

    /// Calculate the safety score for a coordinate.
    ///
    /// Never fails: missing weather yields the neutral 0.5 score with
    /// outcome `NoData`, unusable weather the same score with `Failed`.
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    pub async fn score_location(&self, coordinate: Coordinate) -> SafetyScoreResult {
        let Some(snapshot) = self.weather.current(coordinate).await else {
            return SafetyScoreResult::fallback(Outcome::NoData, "No weather data");
        };

        if let Err(e) = snapshot.validate() {
            warn!("Discarding unusable weather snapshot: {}", e);
            return SafetyScoreResult::fallback(Outcome::Failed, e.to_string());
        }

        let air_quality = self.air_quality.score(coordinate).await;
        if let Some(error) = &air_quality.error {
            warn!("Air quality scoring failed, ignoring its impact: {}", error);
        }

        let (score, weather_type, details) =
            compute_score(&snapshot, air_quality.safety_reduction);

        debug!(
            weather_type = weather_type.label(),
            aq_reduction = air_quality.safety_reduction,
            "Impacts: {:?}",
            details
        );
        info!(
            "Safety score for ({}): {:.3}",
            coordinate.format_coordinates(),
            score
        );

        SafetyScoreResult {
            safety_score: score,
            outcome: Outcome::Scored,
            weather_type,
            weather_code: Some(snapshot.weather_code),
            temperature: Some(snapshot.temperature),
            wind_speed: Some(snapshot.wind_speed),
            precipitation: Some(snapshot.precipitation),
            humidity: Some(snapshot.humidity),
            air_quality: Some(AirQualitySummary::from(&air_quality)),
            details: Some(details),
            error: None,
        }
    }
}
