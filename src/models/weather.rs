//! Weather snapshot model and WMO weather code interpretation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, SafetyError};

/// Current conditions at a coordinate as reported by the weather provider.
///
/// Stored in the durable cache, so fields are kept postcard-friendly
/// (no skipped or flattened fields).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Wind speed at 10m in km/h
    pub wind_speed: f64,
    /// Precipitation in mm over the last hour
    pub precipitation: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// WMO weather interpretation code
    pub weather_code: u8,
    /// Observation time as reported by the provider
    pub observed_at: Option<String>,
    /// When this snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Reject snapshots that would poison the score arithmetic
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("temperature", self.temperature),
            ("wind_speed", self.wind_speed),
            ("precipitation", self.precipitation),
            ("humidity", self.humidity),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SafetyError::validation(format!(
                    "weather field {name} is not a finite number: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}

/// Coarse weather classification derived from the WMO code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    Clear,
    Cloudy,
    Foggy,
    Rain,
    HeavyRain,
    Snow,
    HeavySnow,
    Thunderstorm,
    Unknown,
}

impl WeatherType {
    /// Base impact of this weather type before weighting
    #[must_use]
    pub fn base_impact(self) -> f64 {
        match self {
            WeatherType::Clear => 0.0,
            WeatherType::Cloudy => 0.05,
            WeatherType::Foggy => 0.15,
            WeatherType::Rain => 0.25,
            WeatherType::HeavyRain => 0.5,
            WeatherType::Snow => 0.4,
            WeatherType::HeavySnow => 0.6,
            WeatherType::Thunderstorm => 0.7,
            WeatherType::Unknown => 0.1,
        }
    }

    /// Snake-case label used on the wire
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WeatherType::Clear => "clear",
            WeatherType::Cloudy => "cloudy",
            WeatherType::Foggy => "foggy",
            WeatherType::Rain => "rain",
            WeatherType::HeavyRain => "heavy_rain",
            WeatherType::Snow => "snow",
            WeatherType::HeavySnow => "heavy_snow",
            WeatherType::Thunderstorm => "thunderstorm",
            WeatherType::Unknown => "unknown",
        }
    }
}

/// Interpret a WMO weather code.
///
/// The explicit lists are matched before the 80..=99 thunderstorm range, so
/// rain and snow showers (80-82, 85, 86) keep their own classification.
#[must_use]
pub fn interpret_weather_code(code: u8) -> (WeatherType, f64) {
    let weather_type = match code {
        0 => WeatherType::Clear,
        1..=3 => WeatherType::Cloudy,
        45 | 48 => WeatherType::Foggy,
        51 | 53 | 55 | 61 | 63 | 65 => WeatherType::Rain,
        67 | 80 | 81 | 82 => WeatherType::HeavyRain,
        71 | 73 | 75 => WeatherType::Snow,
        77 | 85 | 86 => WeatherType::HeavySnow,
        80..=99 => WeatherType::Thunderstorm,
        _ => WeatherType::Unknown,
    };
    (weather_type, weather_type.base_impact())
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, WeatherType::Clear, 0.0)]
    #[case(2, WeatherType::Cloudy, 0.05)]
    #[case(48, WeatherType::Foggy, 0.15)]
    #[case(61, WeatherType::Rain, 0.25)]
    #[case(67, WeatherType::HeavyRain, 0.5)]
    #[case(81, WeatherType::HeavyRain, 0.5)]
    #[case(73, WeatherType::Snow, 0.4)]
    #[case(86, WeatherType::HeavySnow, 0.6)]
    #[case(95, WeatherType::Thunderstorm, 0.7)]
    #[case(83, WeatherType::Thunderstorm, 0.7)]
    #[case(99, WeatherType::Thunderstorm, 0.7)]
    #[case(56, WeatherType::Unknown, 0.1)]
    #[case(100, WeatherType::Unknown, 0.1)]
    fn test_interpret_weather_code(
        #[case] code: u8,
        #[case] expected: WeatherType,
        #[case] impact: f64,
    ) {
        let (weather_type, base_impact) = interpret_weather_code(code);
        assert_eq!(weather_type, expected);
        assert_eq!(base_impact, impact);
    }

    #[test]
    fn test_weather_type_serializes_snake_case() {
        let json = serde_json::to_string(&WeatherType::HeavyRain).unwrap();
        assert_eq!(json, "\"heavy_rain\"");
        assert_eq!(WeatherType::HeavySnow.to_string(), "heavy_snow");
    }

    #[test]
    fn test_validate_rejects_nan() {
        let snapshot = WeatherSnapshot {
            temperature: f64::NAN,
            wind_speed: 5.0,
            precipitation: 0.0,
            humidity: 50.0,
            weather_code: 0,
            observed_at: None,
            fetched_at: Utc::now(),
        };
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_description() {
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(42), "Unknown");
    }
}
