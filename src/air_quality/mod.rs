//! Air quality: station lookups, AQI classification and safety impact

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::{Clock, TtlCache};
use crate::models::{AirQualityRecord, Coordinate};
use crate::{Result, SafetyError};

pub mod aqi;
pub mod impact;
pub mod score;
pub mod waqi;

pub use aqi::calculate_aqi_from_pm25;
pub use impact::calculate_air_quality_safety_impact;
pub use score::{AirQualityScorer, extract_pollutant_value};
pub use waqi::WaqiClient;

const CACHE_NAMESPACE: &str = "air_quality";

/// Upstream source of nearest-station air quality
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    async fn fetch_station(&self, coordinate: Coordinate) -> Result<AirQualityRecord>;
}

/// Air quality lookups through a TTL cache, falling back to an
/// "unavailable" record whenever the provider cannot deliver
pub struct AirQualityService {
    provider: Arc<dyn AirQualityProvider>,
    cache: Arc<dyn TtlCache<AirQualityRecord>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl AirQualityService {
    pub fn new(
        provider: Arc<dyn AirQualityProvider>,
        cache: Arc<dyn TtlCache<AirQualityRecord>>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            ttl,
        }
    }

    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    pub async fn station(&self, coordinate: Coordinate) -> AirQualityRecord {
        let key = coordinate.cache_key(CACHE_NAMESPACE);

        match self.cache.get(&key).await {
            Ok(Some(record)) => {
                debug!("Using cached air quality data for {}", key);
                return record;
            }
            Ok(None) => {}
            Err(e) => warn!("Air quality cache read failed for {}: {}", key, e),
        }

        match self.provider.fetch_station(coordinate).await {
            Ok(record) => {
                if let Err(e) = self.cache.put(&key, record.clone(), self.ttl).await {
                    warn!("Air quality cache write failed for {}: {}", key, e);
                }
                record
            }
            Err(SafetyError::Config { message }) => {
                debug!("Air quality lookup skipped: {}", message);
                AirQualityRecord::unavailable(coordinate, self.clock.now())
            }
            Err(e) => {
                warn!(
                    "WAQI API error for ({}): {}",
                    coordinate.format_coordinates(),
                    e
                );
                AirQualityRecord::unavailable(coordinate, self.clock.now())
            }
        }
    }
}
