//! Open-Meteo current-conditions client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use super::WeatherProvider;
use crate::cache::Clock;
use crate::config::WeatherConfig;
use crate::models::weather::weather_code_to_description;
use crate::models::{Coordinate, WeatherSnapshot};
use crate::{Result, SafetyError, http};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,rain,showers,snowfall,wind_speed_10m,wind_direction_10m,weather_code";

// Values assumed when the provider omits a current field
const DEFAULT_TEMPERATURE: f64 = 20.0;
const DEFAULT_HUMIDITY: f64 = 50.0;

/// Forecast endpoint response, reduced to the current block
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    time: Option<String>,
    #[serde(rename = "temperature_2m")]
    temperature: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    humidity: Option<f64>,
    precipitation: Option<f64>,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: Option<f64>,
    weather_code: Option<u8>,
}

/// Client for the Open-Meteo forecast API (no API key required)
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            clock,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    async fn fetch_current(&self, coordinate: Coordinate) -> Result<WeatherSnapshot> {
        let start_time = Instant::now();
        let url = Url::parse_with_params(
            &format!("{}/forecast", self.base_url),
            &[
                ("latitude", coordinate.lat.to_string()),
                ("longitude", coordinate.lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .map_err(|e| SafetyError::config(format!("Invalid Open-Meteo base URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SafetyError::api(format!("Open-Meteo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SafetyError::api(format!("Open-Meteo returned an error: {e}")))?;

        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            SafetyError::api(format!("Failed to parse Open-Meteo response: {e}"))
        })?;

        let elapsed = start_time.elapsed();
        if elapsed.as_secs() > 2 {
            warn!("Slow Open-Meteo response: {:.3}s", elapsed.as_secs_f64());
        }

        let snapshot = snapshot_from_response(forecast, self.clock.now())?;
        debug!(
            "Open-Meteo reports {} at {}",
            weather_code_to_description(snapshot.weather_code),
            snapshot.format_temperature()
        );
        Ok(snapshot)
    }
}

fn snapshot_from_response(
    response: ForecastResponse,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot> {
    let current = response
        .current
        .ok_or_else(|| SafetyError::api("No current weather block in Open-Meteo response"))?;

    Ok(WeatherSnapshot {
        temperature: current.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        wind_speed: current.wind_speed.unwrap_or(0.0),
        precipitation: current.precipitation.unwrap_or(0.0),
        humidity: current.humidity.unwrap_or(DEFAULT_HUMIDITY),
        weather_code: current.weather_code.unwrap_or(0),
        observed_at: current.time,
        fetched_at,
    })
}
