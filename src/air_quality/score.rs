//! Station record to air quality score

use haversine::{Location, Units, distance};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::AirQualityService;
use super::impact::calculate_air_quality_safety_impact;
use crate::models::{
    AirQualityRecord, AirQualityScore, Coordinate, Outcome, Pollutant, PollutantReading,
};

const NO_DATA_MESSAGE: &str = "Air quality data unavailable for this location";

/// Find the measured value of a pollutant among the station readings
#[must_use]
pub fn extract_pollutant_value(readings: &[PollutantReading], pollutant: Pollutant) -> Option<f64> {
    readings
        .iter()
        .find(|reading| reading.parameter == pollutant)
        .map(|reading| reading.value)
}

fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    distance(
        Location {
            latitude: from.lat,
            longitude: from.lon,
        },
        Location {
            latitude: to.lat,
            longitude: to.lon,
        },
        Units::Kilometers,
    )
}

/// Turns nearest-station data into a safety reduction
pub struct AirQualityScorer {
    service: Arc<AirQualityService>,
}

impl AirQualityScorer {
    pub fn new(service: Arc<AirQualityService>) -> Self {
        Self { service }
    }

    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    pub async fn score(&self, coordinate: Coordinate) -> AirQualityScore {
        let record = self.service.station(coordinate).await;
        score_record(&record, coordinate)
    }
}

fn neutral(record: &AirQualityRecord, outcome: Outcome) -> AirQualityScore {
    AirQualityScore {
        outcome,
        location_name: record.location_name.clone(),
        lat: record.station.lat,
        lon: record.station.lon,
        distance_km: None,
        last_updated: None,
        safety_reduction: 0.0,
        warnings: Vec::new(),
        pollutants: Default::default(),
        data_available: false,
        message: None,
        error: None,
    }
}

fn score_record(record: &AirQualityRecord, requested: Coordinate) -> AirQualityScore {
    if !record.has_measurements() {
        debug!("No air quality measurements near {}", requested.format_coordinates());
        return AirQualityScore {
            message: Some(NO_DATA_MESSAGE.to_string()),
            ..neutral(record, Outcome::NoData)
        };
    }

    let value = |pollutant| extract_pollutant_value(&record.readings, pollutant);
    let impact = calculate_air_quality_safety_impact(
        value(Pollutant::Pm25),
        value(Pollutant::Pm10),
        value(Pollutant::No2),
        value(Pollutant::O3),
    );

    if let Some(error) = impact.error {
        return AirQualityScore {
            error: Some(error),
            ..neutral(record, Outcome::Failed)
        };
    }

    AirQualityScore {
        outcome: Outcome::Scored,
        location_name: record.location_name.clone(),
        lat: record.station.lat,
        lon: record.station.lon,
        distance_km: Some(distance_km(requested, record.station)),
        last_updated: Some(record.last_updated),
        safety_reduction: impact.safety_reduction,
        warnings: impact.warnings,
        pollutants: impact.details,
        data_available: true,
        message: None,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::air_quality::UNKNOWN_STATION;
    use chrono::Utc;

    fn record(readings: Vec<PollutantReading>) -> AirQualityRecord {
        AirQualityRecord {
            location_name: "Anand Vihar, Delhi".to_string(),
            station: Coordinate::new(28.6469, 77.3152).unwrap(),
            readings,
            aqi: None,
            dominant_pollutant: None,
            observed_at: None,
            last_updated: Utc::now(),
            data_available: true,
            message: None,
        }
    }

    fn reading(parameter: Pollutant, value: f64) -> PollutantReading {
        PollutantReading { parameter, value }
    }

    #[test]
    fn test_extract_pollutant_value() {
        let readings = vec![reading(Pollutant::Pm10, 90.0), reading(Pollutant::Pm25, 40.0)];
        assert_eq!(extract_pollutant_value(&readings, Pollutant::Pm25), Some(40.0));
        assert_eq!(extract_pollutant_value(&readings, Pollutant::O3), None);
        assert_eq!(extract_pollutant_value(&[], Pollutant::Pm25), None);
    }

    #[test]
    fn test_scored_record() {
        let requested = Coordinate::new(28.6139, 77.2090).unwrap();
        let score = score_record(&record(vec![reading(Pollutant::Pm25, 160.0)]), requested);

        assert_eq!(score.outcome, Outcome::Scored);
        assert!(score.data_available);
        assert!((score.safety_reduction - 0.45).abs() < 1e-9);
        assert_eq!(score.warnings.len(), 1);
        assert!(score.pollutants.contains_key(&Pollutant::Pm25));

        // Connaught Place to Anand Vihar is roughly 11 km
        let distance = score.distance_km.unwrap();
        assert!(distance > 9.0 && distance < 13.0, "distance was {distance}");
    }

    #[test]
    fn test_unavailable_record_is_no_data() {
        let requested = Coordinate::new(10.0, 10.0).unwrap();
        let score = score_record(&AirQualityRecord::unavailable(requested, Utc::now()), requested);

        assert_eq!(score.outcome, Outcome::NoData);
        assert_eq!(score.safety_reduction, 0.0);
        assert!(!score.data_available);
        assert_eq!(score.location_name, UNKNOWN_STATION);
        assert_eq!(score.message.as_deref(), Some(NO_DATA_MESSAGE));
        assert!(score.error.is_none());
    }

    #[test]
    fn test_station_without_readings_or_aqi_is_no_data() {
        let requested = Coordinate::new(28.6, 77.2).unwrap();
        let score = score_record(&record(Vec::new()), requested);
        assert_eq!(score.outcome, Outcome::NoData);
    }

    #[test]
    fn test_station_aqi_only_is_scored_without_reduction() {
        let requested = Coordinate::new(28.6, 77.2).unwrap();
        let mut station = record(Vec::new());
        station.aqi = Some(80.0);

        let score = score_record(&station, requested);
        assert_eq!(score.outcome, Outcome::Scored);
        assert!(score.data_available);
        assert_eq!(score.safety_reduction, 0.0);
    }

    #[test]
    fn test_invalid_reading_is_failed() {
        let requested = Coordinate::new(28.6, 77.2).unwrap();
        let score = score_record(&record(vec![reading(Pollutant::Pm25, -3.0)]), requested);

        assert_eq!(score.outcome, Outcome::Failed);
        assert_eq!(score.safety_reduction, 0.0);
        assert!(!score.data_available);
        assert!(score.error.is_some());
    }
}
