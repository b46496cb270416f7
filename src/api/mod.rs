use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::VERSION;
use crate::models::{
    Coordinate, RouteSafetyResult, SafetyScoreResult, SafetyStatus, Waypoint, WeatherType,
};
use crate::safety::{RouteAnalyzer, SafetyScorer};

const SERVICE_NAME: &str = "SafeSafar Weather-based Safety Service";
const DATA_SOURCE: &str = "Open-Meteo API";

const INVALID_JSON: &str = "request body must be valid JSON";
const COORDINATES_REQUIRED: &str = "lat and lon are required";
const COORDINATES_NOT_NUMERIC: &str = "lat and lon must be numeric";
const WAYPOINTS_REQUIRED: &str = "waypoints array is required";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<SafetyScorer>,
    pub routes: Arc<RouteAnalyzer>,
}

/// Error returned to HTTP clients as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    /// The body could not be read at all, e.g. it exceeded the size limit
    Rejected(StatusCode, String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::Rejected(status, message) => (status, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SafetyScoreResponse {
    pub lat: f64,
    pub lon: f64,
    pub safety_score: f64,
    pub status: SafetyStatus,
    pub weather_type: WeatherType,
    pub temperature: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub humidity: f64,
}

impl SafetyScoreResponse {
    fn new(coordinate: Coordinate, result: &SafetyScoreResult) -> Self {
        Self {
            lat: coordinate.lat,
            lon: coordinate.lon,
            safety_score: result.safety_score,
            status: result.status(),
            weather_type: result.weather_type,
            temperature: result.temperature.unwrap_or(0.0),
            wind_speed: result.wind_speed.unwrap_or(0.0),
            precipitation: result.precipitation.unwrap_or(0.0),
            humidity: result.humidity.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub data_source: String,
    pub version: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/safety_score", post(safety_score))
        .route("/route_safety", post(route_safety))
        .route("/health", get(health))
        .with_state(state)
}

/// Why a coordinate field could not be read
#[derive(Debug, PartialEq)]
enum FieldError {
    Missing,
    NotNumeric,
}

/// Read a coordinate field that may arrive as a number or a numeric string
fn parse_numeric(value: Option<&Value>) -> Result<f64, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(Value::Number(n)) => n.as_f64().ok_or(FieldError::NotNumeric),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| FieldError::NotNumeric),
        Some(_) => Err(FieldError::NotNumeric),
    }
}

fn parse_lat_lon(body: &Value) -> Result<(f64, f64), FieldError> {
    let lat = parse_numeric(body.get("lat"));
    let lon = parse_numeric(body.get("lon"));
    match (lat, lon) {
        (Ok(lat), Ok(lon)) => Ok((lat, lon)),
        (Err(FieldError::Missing), _) | (_, Err(FieldError::Missing)) => Err(FieldError::Missing),
        _ => Err(FieldError::NotNumeric),
    }
}

fn field_message(error: &FieldError) -> &'static str {
    match error {
        FieldError::Missing => COORDINATES_REQUIRED,
        FieldError::NotNumeric => COORDINATES_NOT_NUMERIC,
    }
}

/// Parse the body as JSON whatever its `Content-Type`
fn json_body(payload: Result<Bytes, BytesRejection>) -> Result<Value, ApiError> {
    let bytes = payload.map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::Rejected(rejection.status(), rejection.body_text())
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!("Request body is not valid JSON: {}", e);
        ApiError::BadRequest(INVALID_JSON.to_string())
    })
}

async fn safety_score(
    State(state): State<AppState>,
    payload: Result<Bytes, BytesRejection>,
) -> Result<Json<SafetyScoreResponse>, ApiError> {
    let body = json_body(payload)?;
    let (lat, lon) =
        parse_lat_lon(&body).map_err(|e| ApiError::BadRequest(field_message(&e).to_string()))?;
    let coordinate =
        Coordinate::new(lat, lon).map_err(|e| ApiError::BadRequest(e.user_message()))?;

    let scorer = state.scorer.clone();
    let result = tokio::spawn(async move { scorer.score_location(coordinate).await })
        .await
        .map_err(|e| {
            error!("Safety score task failed: {}", e);
            ApiError::Internal(format!("Failed to calculate safety score: {e}"))
        })?;

    Ok(Json(SafetyScoreResponse::new(coordinate, &result)))
}

fn parse_waypoints(body: &Value) -> Result<Vec<Waypoint>, ApiError> {
    let items = body
        .get("waypoints")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ApiError::BadRequest(WAYPOINTS_REQUIRED.to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let (lat, lon) = parse_lat_lon(item).map_err(|e| {
                ApiError::BadRequest(format!("waypoint {index}: {}", field_message(&e)))
            })?;
            Coordinate::new(lat, lon).map_err(|e| {
                ApiError::BadRequest(format!("waypoint {index}: {}", e.user_message()))
            })?;
            let name = item.get("name").and_then(Value::as_str).map(str::to_string);
            Ok(Waypoint::new(lat, lon, name))
        })
        .collect()
}

async fn route_safety(
    State(state): State<AppState>,
    payload: Result<Bytes, BytesRejection>,
) -> Result<Json<RouteSafetyResult>, ApiError> {
    let body = json_body(payload)?;
    let waypoints = parse_waypoints(&body)?;

    let routes = state.routes.clone();
    let result = tokio::spawn(async move { routes.assess_route(&waypoints).await })
        .await
        .map_err(|e| {
            error!("Route safety task failed: {}", e);
            ApiError::Internal(format!("Failed to calculate route safety: {e}"))
        })?;

    Ok(Json(result))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        data_source: DATA_SOURCE.to_string(),
        version: VERSION.to_string(),
    })
}
