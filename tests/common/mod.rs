//! Shared fakes and wiring for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use safesafar::cache::ManualClock;
use safesafar::config::ServerConfig;
use safesafar::models::{
    AirQualityRecord, Coordinate, Pollutant, PollutantReading, WeatherSnapshot,
};
use safesafar::{
    AirQualityProvider, AirQualityScorer, AirQualityService, AppState, Clock, MemoryCache,
    RouteAnalyzer, SafetyError, SafetyScorer, TtlCache, WeatherProvider, WeatherService, web,
};

pub const TTL: Duration = Duration::from_secs(600);

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
        observed_at: None,
        fetched_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    }
}

/// Weather provider returning a fixed snapshot, optionally failing
pub struct FakeWeather {
    snapshot: Mutex<WeatherSnapshot>,
    pub offline: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeWeather {
    pub fn new(snapshot: WeatherSnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(snapshot),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch_current(&self, _coordinate: Coordinate) -> safesafar::Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SafetyError::api("Open-Meteo request failed: connection refused"));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

/// Air quality provider returning fixed readings; `None` acts like a missing token
pub struct FakeAirQuality {
    readings: Option<Vec<PollutantReading>>,
    pub offline: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeAirQuality {
    pub fn new(readings: Option<Vec<PollutantReading>>) -> Arc<Self> {
        Arc::new(Self {
            readings,
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn none() -> Arc<Self> {
        Self::new(None)
    }

    pub fn pm25(value: f64) -> Arc<Self> {
        Self::new(Some(vec![PollutantReading {
            parameter: Pollutant::Pm25,
            value,
        }]))
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AirQualityProvider for FakeAirQuality {
    async fn fetch_station(&self, coordinate: Coordinate) -> safesafar::Result<AirQualityRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(readings) = &self.readings else {
            return Err(SafetyError::config("WAQI API token not configured"));
        };
        if self.offline.load(Ordering::SeqCst) {
            return Err(SafetyError::api("WAQI request failed: timed out"));
        }
        Ok(AirQualityRecord {
            location_name: "Fake Station".to_string(),
            station: coordinate,
            readings: readings.clone(),
            aqi: None,
            dominant_pollutant: None,
            observed_at: None,
            last_updated: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            data_available: true,
            message: None,
        })
    }
}

pub struct Harness {
    pub app: Router,
    pub clock: Arc<ManualClock>,
}

/// Build the application around the fakes, with the given weather cache
pub fn harness_with_cache(
    weather: Arc<FakeWeather>,
    air_quality: Arc<FakeAirQuality>,
    weather_cache: Arc<dyn TtlCache<WeatherSnapshot>>,
    clock: Arc<ManualClock>,
) -> Harness {
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let weather = WeatherService::new(weather, weather_cache, TTL);
    let air_quality = AirQualityService::new(
        air_quality,
        Arc::new(MemoryCache::<AirQualityRecord>::new(dyn_clock.clone())),
        dyn_clock,
        TTL,
    );
    let scorer = Arc::new(SafetyScorer::new(
        weather,
        AirQualityScorer::new(Arc::new(air_quality)),
    ));
    let routes = Arc::new(RouteAnalyzer::new(scorer.clone(), 4));

    let app = web::app(&ServerConfig::default(), AppState { scorer, routes }).unwrap();
    Harness { app, clock }
}

pub fn harness(weather: Arc<FakeWeather>, air_quality: Arc<FakeAirQuality>) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ));
    let cache = Arc::new(MemoryCache::<WeatherSnapshot>::new(clock.clone()));
    harness_with_cache(weather, air_quality, cache, clock)
}

pub async fn post_raw(app: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, path, &body.to_string()).await
}

pub async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
