//! WAQI (World Air Quality Index) nearest-station client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::AirQualityProvider;
use crate::cache::Clock;
use crate::config::AirQualityConfig;
use crate::models::air_quality::UNKNOWN_STATION;
use crate::models::{AirQualityRecord, Coordinate, Pollutant, PollutantReading};
use crate::{Result, SafetyError, http};

#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

/// Client for the WAQI geo feed. Requires an API token.
pub struct WaqiClient {
    client: ClientWithMiddleware,
    base_url: String,
    token: Option<String>,
    clock: Arc<dyn Clock>,
}

impl WaqiClient {
    pub fn new(config: &AirQualityConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
            clock,
        })
    }
}

#[async_trait]
impl AirQualityProvider for WaqiClient {
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    async fn fetch_station(&self, coordinate: Coordinate) -> Result<AirQualityRecord> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| SafetyError::config("WAQI API token not configured"))?;

        let url = Url::parse_with_params(
            &format!(
                "{}/feed/geo:{};{}/",
                self.base_url, coordinate.lat, coordinate.lon
            ),
            &[("token", token)],
        )
        .map_err(|e| SafetyError::config(format!("Invalid WAQI base URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SafetyError::api(format!("WAQI request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SafetyError::api(format!("WAQI returned an error: {e}")))?;

        let feed: FeedResponse = response
            .json()
            .await
            .map_err(|e| SafetyError::api(format!("Failed to parse WAQI response: {e}")))?;

        let record = record_from_feed(feed, coordinate, self.clock.now())?;
        debug!(
            "WAQI station {} reported {} readings",
            record.location_name,
            record.readings.len()
        );
        Ok(record)
    }
}

fn record_from_feed(
    feed: FeedResponse,
    requested: Coordinate,
    now: DateTime<Utc>,
) -> Result<AirQualityRecord> {
    if feed.status != "ok" {
        let reason = feed.data.as_str().unwrap_or("unknown reason");
        return Err(SafetyError::api(format!(
            "WAQI status '{}': {}",
            feed.status, reason
        )));
    }

    let data = feed.data;
    if !data.is_object() {
        return Err(SafetyError::api("WAQI response has no data object"));
    }

    let city = &data["city"];
    let location_name = city["name"]
        .as_str()
        .unwrap_or(UNKNOWN_STATION)
        .to_string();

    let station = match (city["geo"][0].as_f64(), city["geo"][1].as_f64()) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon).unwrap_or(requested),
        _ => requested,
    };

    let readings = Pollutant::ALL
        .into_iter()
        .filter_map(|parameter| {
            data["iaqi"][parameter.key()]["v"]
                .as_f64()
                .map(|value| PollutantReading { parameter, value })
        })
        .collect();

    Ok(AirQualityRecord {
        location_name,
        station,
        readings,
        aqi: data["aqi"].as_f64(),
        dominant_pollutant: data["dominentpol"].as_str().map(str::to_string),
        observed_at: data["time"]["iso"].as_str().map(str::to_string),
        last_updated: now,
        data_available: true,
        message: None,
    })
}
