//! `SafeSafar` - weather and air-quality based travel safety scoring
//!
//! This library scores single locations and whole routes from current
//! weather conditions (Open-Meteo) and nearby air quality (WAQI), and
//! exposes the scores over a small HTTP API.

pub mod air_quality;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod safety;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use air_quality::{AirQualityProvider, AirQualityScorer, AirQualityService, WaqiClient};
pub use api::AppState;
pub use cache::{Clock, MemoryCache, PersistentCache, SystemClock, TtlCache};
pub use config::SafetyConfig;
pub use error::SafetyError;
pub use models::{
    Coordinate, RouteSafetyResult, SafetyScoreResult, SafetyStatus, Waypoint, WeatherSnapshot,
};
pub use safety::{RouteAnalyzer, SafetyScorer};
pub use weather::{OpenMeteoClient, WeatherProvider, WeatherService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SafetyError>;

#[cfg(test)]
pub(crate) mod testing {
    //! In-crate fakes for the upstream providers

    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::air_quality::{AirQualityProvider, AirQualityScorer, AirQualityService};
    use crate::cache::{Clock, ManualClock, MemoryCache};
    use crate::models::{
        AirQualityRecord, Coordinate, Pollutant, PollutantReading, WeatherSnapshot,
    };
    use crate::safety::SafetyScorer;
    use crate::weather::{WeatherProvider, WeatherService};
    use crate::{Result, SafetyError};

    pub fn snapshot(
        weather_code: u8,
        wind_speed: f64,
        precipitation: f64,
        humidity: f64,
        temperature: f64,
    ) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            wind_speed,
            precipitation,
            humidity,
            weather_code,
            observed_at: Some("2026-03-01T12:00".to_string()),
            fetched_at: Utc::now(),
        }
    }

    pub struct StubWeather {
        snapshot: Mutex<WeatherSnapshot>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubWeather {
        pub fn new(snapshot: WeatherSnapshot) -> Self {
            Self {
                snapshot: Mutex::new(snapshot),
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        /// Clear sky, light wind, 20°C
        pub fn clear() -> Self {
            Self::new(snapshot(0, 5.0, 0.0, 50.0, 20.0))
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubWeather {
        async fn fetch_current(&self, _coordinate: Coordinate) -> Result<WeatherSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(SafetyError::api("connection refused"));
            }
            Ok(self.snapshot.lock().unwrap().clone())
        }
    }

    pub struct StubAirQuality {
        readings: Option<Vec<PollutantReading>>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubAirQuality {
        pub fn with_readings(readings: Vec<PollutantReading>) -> Self {
            Self {
                readings: Some(readings),
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_pm25(value: f64) -> Self {
            Self::with_readings(vec![PollutantReading {
                parameter: Pollutant::Pm25,
                value,
            }])
        }

        /// Behaves like a WAQI client without a configured token
        pub fn without_token() -> Self {
            Self {
                readings: None,
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AirQualityProvider for StubAirQuality {
        async fn fetch_station(&self, coordinate: Coordinate) -> Result<AirQualityRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let Some(readings) = &self.readings else {
                return Err(SafetyError::config("WAQI API token not configured"));
            };
            if self.failing.load(Ordering::SeqCst) {
                return Err(SafetyError::api("timed out"));
            }
            Ok(AirQualityRecord {
                location_name: "Test Station".to_string(),
                station: coordinate,
                readings: readings.clone(),
                aqi: None,
                dominant_pollutant: Some("pm25".to_string()),
                observed_at: None,
                last_updated: Utc::now(),
                data_available: true,
                message: None,
            })
        }
    }

    /// Scorer wired to the given fakes with in-memory caches
    pub fn scorer(weather: Arc<StubWeather>, air_quality: Arc<StubAirQuality>) -> SafetyScorer {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let ttl = Duration::from_secs(600);

        let weather = WeatherService::new(
            weather,
            Arc::new(MemoryCache::<WeatherSnapshot>::new(clock.clone())),
            ttl,
        );
        let air_quality = AirQualityService::new(
            air_quality,
            Arc::new(MemoryCache::<AirQualityRecord>::new(clock.clone())),
            clock,
            ttl,
        );
        SafetyScorer::new(weather, AirQualityScorer::new(Arc::new(air_quality)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
