//! Route-level aggregation of waypoint safety scores

use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::SafetyScorer;
use crate::models::{
    Coordinate, RouteSafetyResult, RouteStatus, SafetyScoreResult, SafetyStatus, Waypoint,
    WaypointSafety,
};

/// Scores every waypoint of a route and summarises the result
pub struct RouteAnalyzer {
    scorer: Arc<SafetyScorer>,
    max_concurrent: usize,
}

impl RouteAnalyzer {
    pub fn new(scorer: Arc<SafetyScorer>, max_concurrent: usize) -> Self {
        Self {
            scorer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Assess an ordered list of waypoints.
    ///
    /// All coordinates are validated before any lookup; one invalid
    /// coordinate yields an error-tagged result with status `UNKNOWN`.
    /// Lookups run concurrently but the output keeps the input order.
    #[instrument(skip(self, waypoints), fields(waypoints = waypoints.len()))]
    pub async fn assess_route(&self, waypoints: &[Waypoint]) -> RouteSafetyResult {
        let coordinates = match waypoints
            .iter()
            .map(Waypoint::coordinate)
            .collect::<crate::Result<Vec<_>>>()
        {
            Ok(coordinates) => coordinates,
            Err(e) => {
                warn!("Rejecting route: {}", e);
                return RouteSafetyResult::failed(e.user_message());
            }
        };

        let scored: Vec<WaypointSafety> =
            stream::iter(waypoints.iter().cloned().zip(coordinates))
                .map(|(waypoint, coordinate)| {
                    let scorer = Arc::clone(&self.scorer);
                    async move {
                        let result = scorer.score_location(coordinate).await;
                        waypoint_safety(&waypoint, coordinate, result)
                    }
                })
                .buffered(self.max_concurrent)
                .collect()
                .await;

        let result = summarise(scored);
        info!(
            "Route assessed: {} waypoints, average {:.3}, {}",
            result.waypoints.len(),
            result.average_safety,
            result.route_status
        );
        result
    }
}

fn waypoint_safety(
    waypoint: &Waypoint,
    coordinate: Coordinate,
    result: SafetyScoreResult,
) -> WaypointSafety {
    WaypointSafety {
        lat: coordinate.lat,
        lon: coordinate.lon,
        name: waypoint.display_name().to_string(),
        safety_score: result.safety_score,
        status: result.status(),
        weather_type: result.weather_type,
        temperature: result.temperature.unwrap_or(0.0),
        wind_speed: result.wind_speed.unwrap_or(0.0),
        precipitation: result.precipitation.unwrap_or(0.0),
        humidity: result.humidity.unwrap_or(0.0),
        air_quality: result.air_quality,
        details: result.details,
    }
}

fn summarise(waypoints: Vec<WaypointSafety>) -> RouteSafetyResult {
    let average_safety = if waypoints.is_empty() {
        SafetyScoreResult::FALLBACK_SCORE
    } else {
        waypoints.iter().map(|w| w.safety_score).sum::<f64>() / waypoints.len() as f64
    };

    let unsafe_areas: Vec<WaypointSafety> = waypoints
        .iter()
        .filter(|w| w.status != SafetyStatus::Safe)
        .cloned()
        .collect();
    let unsafe_count = unsafe_areas.len();

    RouteSafetyResult {
        route_status: RouteStatus::from_unsafe_count(unsafe_count, waypoints.len()),
        waypoints,
        average_safety,
        unsafe_areas,
        unsafe_count,
        error: None,
    }
}
