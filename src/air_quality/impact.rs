//! Pollutant concentrations to safety reduction

use tracing::warn;

use super::aqi::calculate_aqi_from_pm25;
use crate::models::{Pollutant, PollutantDetail, SafetyImpact};
use crate::{Result, SafetyError};

/// Upper bound on the combined reduction
pub const MAX_REDUCTION: f64 = 0.85;

/// One rung of a threshold ladder: strictly above `threshold` adds `reduction`
struct Rung {
    threshold: f64,
    reduction: f64,
    label: &'static str,
    advice: Option<&'static str>,
}

const fn rung(
    threshold: f64,
    reduction: f64,
    label: &'static str,
    advice: Option<&'static str>,
) -> Rung {
    Rung {
        threshold,
        reduction,
        label,
        advice,
    }
}

const DO_NOT_TRAVEL: Option<&str> = Some("DO NOT TRAVEL");
const AVOID_TRAVEL: Option<&str> = Some("Avoid travel");

const PM25_LADDER: [Rung; 4] = [
    rung(250.0, 0.60, "Hazardous", DO_NOT_TRAVEL),
    rung(150.0, 0.45, "Very high", AVOID_TRAVEL),
    rung(55.0, 0.35, "Unhealthy", Some("Use caution")),
    rung(35.0, 0.20, "Moderate", None),
];

const PM10_LADDER: [Rung; 3] = [
    rung(500.0, 0.25, "Hazardous", DO_NOT_TRAVEL),
    rung(200.0, 0.20, "High", AVOID_TRAVEL),
    rung(100.0, 0.10, "Moderate", None),
];

const NO2_LADDER: [Rung; 2] = [
    rung(200.0, 0.20, "High", AVOID_TRAVEL),
    rung(100.0, 0.15, "Moderate", None),
];

const O3_LADDER: [Rung; 2] = [
    rung(150.0, 0.25, "High", AVOID_TRAVEL),
    rung(70.0, 0.15, "Moderate", None),
];

fn ladder(pollutant: Pollutant) -> &'static [Rung] {
    match pollutant {
        Pollutant::Pm25 => &PM25_LADDER,
        Pollutant::Pm10 => &PM10_LADDER,
        Pollutant::No2 => &NO2_LADDER,
        Pollutant::O3 => &O3_LADDER,
        Pollutant::So2 | Pollutant::Co => &[],
    }
}

fn display_name(pollutant: Pollutant) -> &'static str {
    match pollutant {
        Pollutant::Pm25 => "PM2.5",
        Pollutant::Pm10 => "PM10",
        Pollutant::No2 => "NO2",
        Pollutant::O3 => "O3",
        Pollutant::So2 => "SO2",
        Pollutant::Co => "CO",
    }
}

fn unit(pollutant: Pollutant) -> &'static str {
    match pollutant {
        Pollutant::Pm25 | Pollutant::Pm10 => "μg/m³",
        _ => "ppb",
    }
}

fn warning(pollutant: Pollutant, value: f64, rung: &Rung) -> String {
    let base = format!(
        "{} {}: {:.1} {}",
        rung.label,
        display_name(pollutant),
        value,
        unit(pollutant)
    );
    match rung.advice {
        Some(advice) => format!("{base} - {advice}"),
        None => base,
    }
}

/// Compute the safety reduction for the given concentrations.
///
/// Each pollutant walks its own ladder and contributes the first rung it
/// exceeds. Absent pollutants contribute nothing. Invalid concentrations
/// produce a zero-impact result carrying `error` instead of failing.
#[must_use]
pub fn calculate_air_quality_safety_impact(
    pm25: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    o3: Option<f64>,
) -> SafetyImpact {
    let inputs = [
        (Pollutant::Pm25, pm25),
        (Pollutant::Pm10, pm10),
        (Pollutant::No2, no2),
        (Pollutant::O3, o3),
    ];

    match compute_impact(&inputs) {
        Ok(impact) => impact,
        Err(e) => {
            warn!("Error calculating air quality impact: {}", e);
            SafetyImpact::failed(e.to_string())
        }
    }
}

fn compute_impact(inputs: &[(Pollutant, Option<f64>)]) -> Result<SafetyImpact> {
    let mut impact = SafetyImpact::default();
    let mut reduction = 0.0;

    for &(pollutant, value) in inputs {
        let Some(value) = value else { continue };
        if !value.is_finite() || value < 0.0 {
            return Err(SafetyError::validation(format!(
                "invalid {pollutant} concentration: {value}"
            )));
        }

        let detail = if pollutant == Pollutant::Pm25 {
            let (aqi, category) = calculate_aqi_from_pm25(Some(value));
            PollutantDetail {
                value,
                aqi,
                category: Some(category),
            }
        } else {
            PollutantDetail::value(value)
        };
        impact.details.insert(pollutant, detail);

        if let Some(rung) = ladder(pollutant).iter().find(|r| value > r.threshold) {
            reduction += rung.reduction;
            impact.warnings.push(warning(pollutant, value, rung));
        }
    }

    impact.safety_reduction = f64::min(reduction, MAX_REDUCTION);
    impact.air_quality_impact = !impact.warnings.is_empty();
    Ok(impact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AqiCategory;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_data_is_zero_impact() {
        let impact = calculate_air_quality_safety_impact(None, None, None, None);
        assert_eq!(impact.safety_reduction, 0.0);
        assert!(impact.warnings.is_empty());
        assert!(impact.details.is_empty());
        assert!(!impact.air_quality_impact);
        assert!(impact.error.is_none());
    }

    #[rstest]
    #[case(10.0, 0.0)]
    #[case(35.0, 0.0)]
    #[case(35.1, 0.20)]
    #[case(55.1, 0.35)]
    #[case(150.1, 0.45)]
    #[case(250.1, 0.60)]
    fn test_pm25_ladder(#[case] pm25: f64, #[case] expected: f64) {
        let impact = calculate_air_quality_safety_impact(Some(pm25), None, None, None);
        assert!(approx(impact.safety_reduction, expected));
        assert_eq!(impact.air_quality_impact, expected > 0.0);
    }

    #[rstest]
    #[case(None, Some(501.0), None, None, 0.25)]
    #[case(None, Some(201.0), None, None, 0.20)]
    #[case(None, Some(101.0), None, None, 0.10)]
    #[case(None, None, Some(201.0), None, 0.20)]
    #[case(None, None, Some(101.0), None, 0.15)]
    #[case(None, None, None, Some(151.0), 0.25)]
    #[case(None, None, None, Some(71.0), 0.15)]
    fn test_other_ladders(
        #[case] pm25: Option<f64>,
        #[case] pm10: Option<f64>,
        #[case] no2: Option<f64>,
        #[case] o3: Option<f64>,
        #[case] expected: f64,
    ) {
        let impact = calculate_air_quality_safety_impact(pm25, pm10, no2, o3);
        assert!(approx(impact.safety_reduction, expected));
        assert_eq!(impact.warnings.len(), 1);
    }

    #[test]
    fn test_warning_texts() {
        let impact =
            calculate_air_quality_safety_impact(Some(300.0), Some(250.0), Some(150.0), Some(80.0));
        assert_eq!(
            impact.warnings,
            vec![
                "Hazardous PM2.5: 300.0 μg/m³ - DO NOT TRAVEL",
                "High PM10: 250.0 μg/m³ - Avoid travel",
                "Moderate NO2: 150.0 ppb",
                "Moderate O3: 80.0 ppb",
            ]
        );
    }

    #[test]
    fn test_reduction_is_capped() {
        let impact =
            calculate_air_quality_safety_impact(Some(300.0), Some(600.0), Some(300.0), Some(200.0));
        assert!(approx(impact.safety_reduction, MAX_REDUCTION));
        assert_eq!(impact.warnings.len(), 4);
    }

    #[test]
    fn test_pm25_detail_carries_aqi() {
        let impact = calculate_air_quality_safety_impact(Some(40.0), Some(20.0), None, None);
        let pm25 = &impact.details[&Pollutant::Pm25];
        assert_eq!(pm25.category, Some(AqiCategory::UnhealthySensitive));
        assert!(pm25.aqi.is_some());

        let pm10 = &impact.details[&Pollutant::Pm10];
        assert_eq!(pm10.value, 20.0);
        assert!(pm10.aqi.is_none());
        assert!(!impact.details.contains_key(&Pollutant::No2));
    }

    #[rstest]
    #[case(Some(-1.0), None)]
    #[case(Some(f64::NAN), None)]
    #[case(None, Some(f64::INFINITY))]
    fn test_invalid_concentration_is_reported(
        #[case] pm25: Option<f64>,
        #[case] pm10: Option<f64>,
    ) {
        let impact = calculate_air_quality_safety_impact(pm25, pm10, None, None);
        assert_eq!(impact.safety_reduction, 0.0);
        assert!(impact.warnings.is_empty());
        assert!(impact.details.is_empty());
        assert!(impact.error.unwrap().starts_with("Invalid input: invalid"));
    }
}
