//! PM2.5 to AQI classification using piecewise-linear breakpoints

use crate::models::AqiCategory;

/// Highest value on the AQI scale
pub const MAX_AQI: f64 = 500.0;

/// Calculate AQI from a PM2.5 concentration (μg/m³).
///
/// Returns `(None, Unknown)` when no concentration is available. The AQI is
/// clamped into `[0, 500]`.
#[must_use]
pub fn calculate_aqi_from_pm25(pm25: Option<f64>) -> (Option<f64>, AqiCategory) {
    let Some(pm25) = pm25 else {
        return (None, AqiCategory::Unknown);
    };

    let (aqi, category) = match pm25 {
        c if c <= 12.0 => (c / 12.0 * 50.0, AqiCategory::Good),
        c if c <= 35.4 => (
            interpolate(c, 12.1, 35.4, 50.0, 50.0),
            AqiCategory::Moderate,
        ),
        c if c <= 55.4 => (
            interpolate(c, 35.5, 55.4, 100.0, 50.0),
            AqiCategory::UnhealthySensitive,
        ),
        c if c <= 150.4 => (
            interpolate(c, 55.5, 150.4, 150.0, 50.0),
            AqiCategory::Unhealthy,
        ),
        c if c <= 250.4 => (
            interpolate(c, 150.5, 250.4, 200.0, 100.0),
            AqiCategory::VeryUnhealthy,
        ),
        _ => (MAX_AQI, AqiCategory::Hazardous),
    };

    (Some(aqi.clamp(0.0, MAX_AQI)), category)
}

fn interpolate(concentration: f64, low: f64, high: f64, aqi_low: f64, aqi_span: f64) -> f64 {
    (concentration - low) / (high - low) * aqi_span + aqi_low
}
