use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::air_quality::{AirQualityScorer, AirQualityService, WaqiClient};
use crate::api::{self, AppState};
use crate::cache::{Clock, MemoryCache, PersistentCache, SystemClock};
use crate::config::{SafetyConfig, ServerConfig};
use crate::models::AirQualityRecord;
use crate::safety::{RouteAnalyzer, SafetyScorer};
use crate::weather::{OpenMeteoClient, WeatherService};

/// Wire providers, caches and scorers from configuration
pub fn build_state(config: &SafetyConfig) -> Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
    let weather_cache = PersistentCache::open(&cache_dir, clock.clone())?;

    let weather = WeatherService::new(
        Arc::new(OpenMeteoClient::new(&config.weather, clock.clone())?),
        Arc::new(weather_cache),
        config.weather.cache_ttl(),
    );

    if config.air_quality.token().is_none() {
        tracing::warn!("No WAQI API token configured; air quality will be reported as unavailable");
    }
    let air_quality = AirQualityService::new(
        Arc::new(WaqiClient::new(&config.air_quality, clock.clone())?),
        Arc::new(MemoryCache::<AirQualityRecord>::with_max_entries(
            clock.clone(),
            config.cache.max_memory_entries,
        )),
        clock,
        config.air_quality.cache_ttl(),
    );

    let scorer = Arc::new(SafetyScorer::new(
        weather,
        AirQualityScorer::new(Arc::new(air_quality)),
    ));
    let routes = Arc::new(RouteAnalyzer::new(
        scorer.clone(),
        config.route.max_concurrent_lookups,
    ));

    Ok(AppState { scorer, routes })
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let allow_origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid allowed origin: {origin}"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

/// The full HTTP application: routes plus tracing, body limit and CORS
pub fn app(config: &ServerConfig, state: AppState) -> Result<Router> {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(cors_layer(config)?);

    Ok(api::router(state).layer(middleware))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

pub async fn run(config: &SafetyConfig, state: AppState) -> Result<()> {
    let app = app(&config.server, state)?;

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("SafeSafar server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Server error")?;
    Ok(())
}
