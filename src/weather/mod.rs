//! Weather data access: the provider seam and its cached front

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::cache::TtlCache;
use crate::models::{Coordinate, WeatherSnapshot};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

const CACHE_NAMESPACE: &str = "weather";

/// Upstream source of current weather conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_current(&self, coordinate: Coordinate) -> Result<WeatherSnapshot>;
}

/// Weather lookups through a coordinate-keyed TTL cache.
///
/// Provider failures are logged and reported as "no data"; cache failures
/// are logged and treated as misses.
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn TtlCache<WeatherSnapshot>>,
    ttl: Duration,
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<dyn TtlCache<WeatherSnapshot>>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    pub async fn current(&self, coordinate: Coordinate) -> Option<WeatherSnapshot> {
        let key = coordinate.cache_key(CACHE_NAMESPACE);

        match self.cache.get(&key).await {
            Ok(Some(snapshot)) => {
                debug!("Using cached weather data for {}", key);
                return Some(snapshot);
            }
            Ok(None) => {}
            Err(e) => warn!("Weather cache read failed for {}: {}", key, e),
        }

        let snapshot = match self.provider.fetch_current(coordinate).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Weather API error for ({}): {}",
                    coordinate.format_coordinates(),
                    e
                );
                return None;
            }
        };

        if let Err(e) = self.cache.put(&key, snapshot.clone(), self.ttl).await {
            warn!("Weather cache write failed for {}: {}", key, e);
        }
        Some(snapshot)
    }
}
