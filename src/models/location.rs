//! Coordinate and waypoint models

use serde::{Deserialize, Serialize};

use crate::{Result, SafetyError};

/// Name used for waypoints that arrive without one
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A validated geographic point
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SafetyError::validation(format!(
                "lat must be between -90 and 90, got {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(SafetyError::validation(format!(
                "lon must be between -180 and 180, got {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Format coordinate as a display string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(2));
        // adding 0.0 turns -0.0 into 0.0 so both sides of the meridian share a bucket
        let lat = (self.lat * multiplier).round() / multiplier + 0.0;
        let lon = (self.lon * multiplier).round() / multiplier + 0.0;
        (lat, lon)
    }

    /// Generate the cache key for this coordinate within a namespace
    #[must_use]
    pub fn cache_key(&self, namespace: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(2);
        format!("{namespace}:{lat:.2}:{lon:.2}")
    }
}

/// One named point of a route, as submitted by the caller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Waypoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64, name: Option<String>) -> Self {
        Self { lat, lon, name }
    }

    /// Display name, falling back to [`UNKNOWN_LOCATION`]
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_LOCATION)
    }

    /// Validate the raw coordinates of this waypoint
    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_cache_key() {
        let coordinate = Coordinate::new(28.7041, 77.1025).unwrap();
        assert_eq!(coordinate.cache_key("weather"), "weather:28.70:77.10");
    }

    #[test]
    fn test_nearby_points_share_cache_key() {
        let a = Coordinate::new(28.7041, 77.1025).unwrap();
        let b = Coordinate::new(28.6989, 77.0987).unwrap();
        assert_eq!(a.cache_key("aq"), b.cache_key("aq"));
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        let coordinate = Coordinate::new(-0.001, -0.004).unwrap();
        assert_eq!(coordinate.cache_key("weather"), "weather:0.00:0.00");
    }

    #[test]
    fn test_rounded_coordinates() {
        let coordinate = Coordinate::new(46.818_234, 8.227_456).unwrap();
        let (lat, lon) = coordinate.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }

    #[rstest]
    #[case(90.5, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(0.0, 180.1)]
    #[case(0.0, -200.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_coordinates_rejected(#[case] lat: f64, #[case] lon: f64) {
        let err = Coordinate::new(lat, lon).unwrap_err();
        assert!(matches!(err, SafetyError::Validation { .. }));
    }

    #[test]
    fn test_boundary_coordinates_accepted() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_waypoint_default_name() {
        let waypoint = Waypoint::new(28.7, 77.1, None);
        assert_eq!(waypoint.display_name(), "Unknown Location");

        let named = Waypoint::new(28.7, 77.1, Some("Delhi".to_string()));
        assert_eq!(named.display_name(), "Delhi");
    }
}
