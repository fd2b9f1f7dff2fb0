//! Snapshots of completed runs.

use chrono::{DateTime, Utc};
use sitescore_geometry_models::BoundingBox;
use sitescore_mcda_models::{Candidate, ScoringParameters, Snapshot, SnapshotParameters};

/// Records a run's parameters, with weights as applied, alongside its
/// candidates.
#[must_use]
pub fn build_snapshot(
    params: &ScoringParameters,
    candidates: Vec<Candidate>,
    bbox: BoundingBox,
    when: DateTime<Utc>,
) -> Snapshot {
    Snapshot {
        when,
        parameters: SnapshotParameters::from(params),
        candidates,
        bbox,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sitescore_mcda_models::{Mode, Weights};

    use super::*;

    #[test]
    fn records_normalized_weights() {
        let params = ScoringParameters {
            mode: Mode::Avoidance,
            weights: Weights {
                wifi: 2.0,
                road: 2.0,
                ..Weights::zero()
            },
            ..ScoringParameters::default()
        };
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let bbox = BoundingBox::new(-113.7, 53.4, -113.2, 53.7);

        let snapshot = build_snapshot(&params, Vec::new(), bbox, when);
        assert_eq!(snapshot.when, when);
        assert_eq!(snapshot.parameters.mode, Mode::Avoidance);
        let w = snapshot.parameters.weights_normalized.weights();
        assert!((w.wifi - 0.5).abs() < 1e-12);
        assert!((w.road - 0.5).abs() < 1e-12);
        assert!(w.amenity.abs() < f64::EPSILON);
        assert!(snapshot.candidates.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshot = build_snapshot(
            &ScoringParameters::default(),
            Vec::new(),
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            when,
        );
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["parameters"]["roadsPreference"], "closer");
        assert_eq!(json["parameters"]["excludePemu"], true);
        assert!(json["parameters"]["weightsNormalized"]["landUse"].is_number());
    }
}
