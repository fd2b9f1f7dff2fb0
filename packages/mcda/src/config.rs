//! Loading [`ScoringParameters`] from TOML or JSON text.
//!
//! Keys are camelCase and optional; anything missing takes the dashboard
//! default. Parameters are validated after parsing.

use sitescore_mcda_models::ScoringParameters;

use crate::ScoringError;

/// Parses and validates parameters from TOML.
///
/// # Errors
///
/// * [`ScoringError::Toml`] if the text does not parse
/// * [`ScoringError::InvalidParameters`] if a value is out of range
pub fn parameters_from_toml(text: &str) -> Result<ScoringParameters, ScoringError> {
    let params: ScoringParameters = toml::from_str(text)?;
    params.validate()?;
    log::debug!("Loaded scoring parameters: {params:?}");
    Ok(params)
}

/// Parses and validates parameters from JSON.
///
/// # Errors
///
/// * [`ScoringError::Json`] if the text does not parse
/// * [`ScoringError::InvalidParameters`] if a value is out of range
pub fn parameters_from_json(text: &str) -> Result<ScoringParameters, ScoringError> {
    let params: ScoringParameters = serde_json::from_str(text)?;
    params.validate()?;
    log::debug!("Loaded scoring parameters: {params:?}");
    Ok(params)
}

#[cfg(test)]
mod tests {
    use sitescore_mcda_models::{Mode, Preference, ZeroWeightPolicy};

    use super::*;

    #[test]
    fn toml_with_weights_table() {
        let params = parameters_from_toml(
            r#"
cellSizeKm = 0.25
maxDistanceKm = 1.5
mode = "avoidance"
roadsPreference = "farther"
excludePemu = false
zeroWeightPolicy = "equal"

[weights]
wifi = 2.0
landUse = 0.5
"#,
        )
        .unwrap();

        assert!((params.cell_size_km - 0.25).abs() < f64::EPSILON);
        assert_eq!(params.mode, Mode::Avoidance);
        assert_eq!(params.roads_preference, Preference::Farther);
        assert_eq!(params.industry_preference, Preference::Farther);
        assert!(!params.exclude_pemu);
        assert_eq!(params.zero_weight_policy, ZeroWeightPolicy::Equal);
        assert!((params.weights.wifi - 2.0).abs() < f64::EPSILON);
        assert!((params.weights.road - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_toml_is_defaults() {
        assert_eq!(
            parameters_from_toml("").unwrap(),
            ScoringParameters::default()
        );
    }

    #[test]
    fn json_accepts_dashboard_aliases() {
        let params =
            parameters_from_json(r#"{"dMax": 3, "roadsPref": "farther", "excludePEMU": false}"#)
                .unwrap();
        assert!((params.max_distance_km - 3.0).abs() < f64::EPSILON);
        assert_eq!(params.roads_preference, Preference::Farther);
        assert!(!params.exclude_pemu);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parameters_from_json(r#"{"cellSizeKm": 0}"#).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidParameters(_)));

        let err = parameters_from_toml("[weights]\nroad = -1.0\n").unwrap_err();
        assert!(matches!(err, ScoringError::InvalidParameters(_)));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(matches!(
            parameters_from_toml("cellSizeKm = ").unwrap_err(),
            ScoringError::Toml(_)
        ));
        assert!(matches!(
            parameters_from_json("{").unwrap_err(),
            ScoringError::Json(_)
        ));
    }
}
