//! The two-phase scoring pass.
//!
//! Phase one ([`measure`]) queries the layers once per cell center. Phase
//! two ([`compose`]) needs the whole set of measurements, because building
//! density is normalized against the busiest cell, and produces the final
//! [`ScoredCell`]s.

use geo::Point;
use serde_json::Value;
use sitescore_geometry::{Feature, FeatureCollection};
use sitescore_geometry_models::LonLat;
use sitescore_hexgrid::{HexCell, HexGrid};
use sitescore_layer::{DensityStats, LayerSet, ProgressCallback};
use sitescore_mcda_models::{
    Candidate, ComponentScores, Mode, NEUTRAL_COMPONENT, Preference, RawMeasurements,
    ScoredCell, ScoringParameters, Snapshot, clamp_unit,
};

use crate::ScoringError;
use crate::display::{ScoreRange, round_to};
use crate::ranking::top_candidates;
use crate::snapshot::build_snapshot;

/// Raw measurements at one cell center.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMeasurement {
    /// Position in grid order.
    pub index: usize,
    /// Cell center.
    pub center: Point<f64>,
    /// Distances, counts, and classifications.
    pub raw: RawMeasurements,
    /// Center lies in an exclusion zone and exclusion is enabled.
    pub excluded: bool,
}

/// Census density bounds used to normalize the population criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityRange {
    /// Lowest density in the census layer.
    pub min: f64,
    /// Highest density in the census layer.
    pub max: f64,
}

impl From<&DensityStats> for DensityRange {
    fn from(stats: &DensityStats) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
        }
    }
}

/// Population criterion for one cell.
///
/// Exposure favors dense areas and avoidance sparse ones. A missing or
/// non-finite density, or a census layer without spread, is neutral.
#[must_use]
pub fn population_component(density: Option<f64>, range: Option<DensityRange>, mode: Mode) -> f64 {
    let (Some(pd), Some(range)) = (density, range) else {
        return NEUTRAL_COMPONENT;
    };
    if !pd.is_finite() || range.max <= range.min {
        return NEUTRAL_COMPONENT;
    }

    let t = (pd - range.min) / (range.max - range.min);
    clamp_unit(match mode {
        Mode::Exposure => t,
        Mode::Avoidance => 1.0 - t,
    })
}

/// Takes every measurement at `center`.
#[must_use]
pub fn measure_cell(
    layers: &LayerSet,
    index: usize,
    center: Point<f64>,
    params: &ScoringParameters,
) -> CellMeasurement {
    let land_use = layers.land_use_at(center);

    CellMeasurement {
        index,
        center,
        raw: RawMeasurements {
            wifi_km: layers.distance_to_wifi(center),
            amenity_km: layers.distance_to_amenity(center),
            road_km: layers.distance_to_road(center),
            industry_km: layers.distance_to_industry(center),
            building_count: layers.building_count_within(center, params.building_radius_km),
            land_use_label: land_use.label,
            land_use_score: land_use.score,
            population_density: layers.population_density_at(center),
        },
        excluded: params.exclude_pemu && layers.in_exclusion_zone(center),
    }
}

/// Phase one: measures every cell.
pub fn measure(
    layers: &LayerSet,
    cells: &[HexCell],
    params: &ScoringParameters,
    progress: &dyn ProgressCallback,
) -> Vec<CellMeasurement> {
    progress.set_total(u64::try_from(cells.len()).unwrap_or(u64::MAX));
    progress.set_message("Measuring cells".to_string());

    let measurements: Vec<CellMeasurement> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let m = measure_cell(layers, i, cell.center, params);
            progress.inc(1);
            m
        })
        .collect();

    let excluded = measurements.iter().filter(|m| m.excluded).count();
    progress.finish(format!(
        "Measured {} cells ({excluded} excluded)",
        measurements.len()
    ));
    measurements
}

/// Phase two: normalizes, weights, and vetoes.
#[must_use]
pub fn compose(
    measurements: &[CellMeasurement],
    params: &ScoringParameters,
    density: Option<DensityRange>,
) -> Vec<ScoredCell> {
    let weights = params.normalized_weights();
    if weights.is_zero() {
        log::warn!("All weights are zero; every cell scores 0");
    }

    let max_buildings = measurements
        .iter()
        .map(|m| m.raw.building_count)
        .max()
        .unwrap_or(0)
        .max(1);
    #[allow(clippy::cast_precision_loss)]
    let max_buildings = max_buildings as f64;

    let d_max = params.max_distance_km;
    let amenity = params.amenity_preference();

    measurements
        .iter()
        .map(|m| {
            #[allow(clippy::cast_precision_loss)]
            let buildings = m.raw.building_count as f64;

            let components = ComponentScores {
                wifi: Preference::Closer.score(m.raw.wifi_km, d_max),
                amenity: amenity.score(m.raw.amenity_km, d_max),
                road: params.roads_preference.score(m.raw.road_km, d_max),
                land_use: clamp_unit(m.raw.land_use_score),
                building: clamp_unit(buildings / max_buildings),
                population: population_component(m.raw.population_density, density, params.mode),
                industrial: params.industry_preference.score(m.raw.industry_km, d_max),
            };

            let allowed = !m.excluded;
            let score = if allowed {
                clamp_unit(weights.apply(&components))
            } else {
                0.0
            };

            ScoredCell {
                index: m.index,
                center: LonLat::new(m.center.x(), m.center.y()),
                raw: m.raw.clone(),
                components,
                score,
                allowed,
            }
        })
        .collect()
}

/// A finished run: the grid and one scored cell per grid cell.
#[derive(Debug, Clone)]
pub struct ScoringRun {
    /// The analysis grid.
    pub grid: HexGrid,
    /// Scores in grid order.
    pub cells: Vec<ScoredCell>,
    /// Parameters the run used.
    pub parameters: ScoringParameters,
}

impl ScoringRun {
    /// Lowest and highest score of this run.
    #[must_use]
    pub fn score_range(&self) -> Option<ScoreRange> {
        ScoreRange::from_cells(&self.cells)
    }

    /// The best allowed cells, per the run's `top_k`.
    #[must_use]
    pub fn top_candidates(&self) -> Vec<Candidate> {
        top_candidates(&self.cells, self.parameters.top_k)
    }

    /// Snapshot of this run stamped now.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        build_snapshot(
            &self.parameters,
            self.top_candidates(),
            self.grid.bbox(),
            chrono::Utc::now(),
        )
    }

    /// Scored hexagons for rendering: `score`, `lu_score`, `lu_label`,
    /// `d_ind_km`, `allowed`, and a fill `color` on each cell.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let range = self.score_range();

        self.grid
            .iter()
            .zip(&self.cells)
            .map(|(hex, cell)| {
                let mut feature = Feature::new(geo::Geometry::Polygon(hex.polygon.clone()))
                    .with_property("score", round_to(cell.score, 3))
                    .with_property("lu_score", round_to(cell.raw.land_use_score, 2))
                    .with_property("lu_label", cell.raw.land_use_label.as_str())
                    .with_property("d_ind_km", round_to(cell.raw.industry_km, 3))
                    .with_property("allowed", cell.allowed);
                if let Some(range) = range {
                    feature
                        .properties
                        .insert("color".to_string(), Value::from(range.color(cell.score)));
                }
                feature
            })
            .collect()
    }
}

/// Runs both phases over a fresh grid covering the land-use extent.
///
/// # Errors
///
/// * [`ScoringError::NotReady`] if the layers are not ready or the
///   land-use layer has no extent
/// * [`ScoringError::InvalidParameters`] if `params` fails validation
/// * [`ScoringError::Grid`] if the grid cannot be built
pub fn score(
    layers: &LayerSet,
    params: &ScoringParameters,
    progress: &dyn ProgressCallback,
) -> Result<ScoringRun, ScoringError> {
    if !layers.is_ready() {
        return Err(ScoringError::NotReady);
    }
    params.validate()?;

    let bbox = layers.bounding_box().ok_or(ScoringError::NotReady)?;
    let grid = HexGrid::generate(bbox, params.cell_size_km)?;

    let measurements = measure(layers, grid.cells(), params, progress);
    let density = layers.density_stats().map(DensityRange::from);
    let cells = compose(&measurements, params, density);

    let allowed = cells.iter().filter(|c| c.allowed).count();
    log::info!("Scored {} cells, {allowed} allowed", cells.len());

    Ok(ScoringRun {
        grid,
        cells,
        parameters: params.clone(),
    })
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, polygon};
    use sitescore_layer::{LayerInputs, LayerKind, null_progress};
    use sitescore_mcda_models::{Weights, ZeroWeightPolicy};

    use super::*;

    fn raw(wifi_km: f64) -> RawMeasurements {
        RawMeasurements {
            wifi_km,
            amenity_km: 0.3,
            road_km: 0.2,
            industry_km: 1.5,
            building_count: 0,
            land_use_label: "Commercial".to_string(),
            land_use_score: 0.8,
            population_density: None,
        }
    }

    fn measurement(index: usize, wifi_km: f64) -> CellMeasurement {
        CellMeasurement {
            index,
            center: Point::new(0.01 * f64::from(u32::try_from(index).unwrap()), 0.0),
            raw: raw(wifi_km),
            excluded: false,
        }
    }

    fn wifi_only(max_distance_km: f64) -> ScoringParameters {
        ScoringParameters {
            max_distance_km,
            weights: Weights {
                wifi: 1.0,
                ..Weights::zero()
            },
            ..ScoringParameters::default()
        }
    }

    #[test]
    fn four_cell_wifi_scenario() {
        let measurements: Vec<CellMeasurement> = [0.1, 0.5, 2.0, 999.0]
            .iter()
            .enumerate()
            .map(|(i, d)| measurement(i, *d))
            .collect();

        let cells = compose(&measurements, &wifi_only(1.0), None);
        let scores: Vec<f64> = cells.iter().map(|c| c.score).collect();
        let expected = [0.9, 0.5, 0.0, 0.0];
        for (s, e) in scores.iter().zip(expected) {
            assert!((s - e).abs() < 1e-12, "{scores:?}");
        }
        for c in &cells {
            assert!((c.score - c.components.wifi).abs() < 1e-12);
        }

        let ranked = top_candidates(&cells, 10);
        assert_eq!(ranked.len(), 4);
        assert!((ranked[0].score - 0.9).abs() < 1e-12);
        assert!((ranked[1].score - 0.5).abs() < 1e-12);
        assert!(ranked[2].score.abs() < 1e-12 && ranked[3].score.abs() < 1e-12);
    }

    #[test]
    fn components_and_scores_stay_in_unit_range() {
        let mut measurements: Vec<CellMeasurement> = (0..20)
            .map(|i| {
                let mut m = measurement(i, f64::from(u32::try_from(i).unwrap()) * 0.3);
                m.raw.building_count = i * 3;
                m.raw.land_use_score = 1.4;
                m.raw.population_density = Some(f64::from(u32::try_from(i).unwrap()) * 900.0);
                m
            })
            .collect();
        measurements[3].raw.industry_km = -2.0;
        measurements[4].raw.population_density = Some(f64::NAN);

        let params = ScoringParameters {
            weights: Weights {
                wifi: 5.0,
                amenity: 0.5,
                road: 2.0,
                land_use: 1.0,
                building: 3.0,
                population: 1.0,
                industrial: 0.25,
            },
            ..ScoringParameters::default()
        };
        let range = Some(DensityRange {
            min: 0.0,
            max: 10_000.0,
        });

        for cell in compose(&measurements, &params, range) {
            assert!(cell.components.in_unit_range(), "{:?}", cell.components);
            assert!((0.0..=1.0).contains(&cell.score));
        }
    }

    #[test]
    fn excluded_cells_score_zero() {
        let mut measurements = vec![measurement(0, 0.0), measurement(1, 0.5)];
        measurements[0].excluded = true;

        let cells = compose(&measurements, &wifi_only(1.0), None);
        assert!(cells[0].score.abs() < f64::EPSILON);
        assert!(!cells[0].allowed);
        assert!((cells[0].components.wifi - 1.0).abs() < f64::EPSILON);
        assert!(cells[1].allowed);
    }

    #[test]
    fn building_density_is_relative_to_busiest_cell() {
        let mut measurements = vec![measurement(0, 0.0), measurement(1, 0.0)];
        measurements[0].raw.building_count = 2;
        measurements[1].raw.building_count = 8;

        let cells = compose(&measurements, &ScoringParameters::default(), None);
        assert!((cells[0].components.building - 0.25).abs() < 1e-12);
        assert!((cells[1].components.building - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_buildings_anywhere_scores_zero_density() {
        let cells = compose(&[measurement(0, 0.0)], &ScoringParameters::default(), None);
        assert!(cells[0].components.building.abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_weights_follow_policy() {
        let measurements = vec![measurement(0, 0.1)];
        let mut params = ScoringParameters {
            weights: Weights::zero(),
            ..ScoringParameters::default()
        };

        let cells = compose(&measurements, &params, None);
        assert!(cells[0].score.abs() < f64::EPSILON);

        params.zero_weight_policy = ZeroWeightPolicy::Equal;
        let cells = compose(&measurements, &params, None);
        let mean = cells[0].components.to_array().iter().sum::<f64>() / 7.0;
        assert!((cells[0].score - mean).abs() < 1e-12);
    }

    #[test]
    fn population_follows_mode_and_falls_back_to_neutral() {
        let range = Some(DensityRange {
            min: 100.0,
            max: 300.0,
        });
        assert!((population_component(Some(250.0), range, Mode::Exposure) - 0.75).abs() < 1e-12);
        assert!((population_component(Some(250.0), range, Mode::Avoidance) - 0.25).abs() < 1e-12);
        assert!((population_component(None, range, Mode::Exposure) - 0.5).abs() < f64::EPSILON);
        assert!(
            (population_component(Some(f64::INFINITY), range, Mode::Exposure) - 0.5).abs()
                < f64::EPSILON
        );
        let flat = Some(DensityRange {
            min: 50.0,
            max: 50.0,
        });
        assert!((population_component(Some(50.0), flat, Mode::Exposure) - 0.5).abs() < f64::EPSILON);
        assert!((population_component(Some(50.0), None, Mode::Exposure) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn amenity_direction_flips_with_mode() {
        let measurements = vec![measurement(0, 0.0)];
        let mut params = ScoringParameters::default();
        let exposure = compose(&measurements, &params, None)[0].components.amenity;
        params.mode = Mode::Avoidance;
        let avoidance = compose(&measurements, &params, None)[0].components.amenity;
        assert!((exposure - 0.85).abs() < 1e-12);
        assert!((avoidance - 0.15).abs() < 1e-12);
    }

    fn square(min_lon: f64, min_lat: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: min_lon, y: min_lat),
            (x: min_lon + size, y: min_lat),
            (x: min_lon + size, y: min_lat + size),
            (x: min_lon, y: min_lat + size),
            (x: min_lon, y: min_lat),
        ])
    }

    fn small_town() -> LayerSet {
        let mut inputs = LayerInputs::default();
        inputs.set(
            LayerKind::LandUse,
            [Feature::new(square(-113.30, 53.50, 0.02))
                .with_property("lub_zoning", "IH")
                .with_property("lub_description", "IH - HEAVY INDUSTRIAL")]
            .into_iter()
            .collect(),
        );
        inputs.set(
            LayerKind::Wifi,
            [Feature::point(-113.29, 53.51)].into_iter().collect(),
        );
        inputs.set(
            LayerKind::Pemu,
            [Feature::new(square(-113.30, 53.50, 0.01))]
                .into_iter()
                .collect(),
        );
        LayerSet::build(inputs)
    }

    #[test]
    fn score_refuses_until_ready() {
        let layers = small_town();
        let result = score(&layers, &ScoringParameters::default(), &*null_progress());
        assert!(matches!(result, Err(ScoringError::NotReady)));
    }

    #[test]
    fn score_rejects_invalid_parameters() {
        let mut layers = small_town();
        layers.mark_ready();
        let params = ScoringParameters {
            cell_size_km: -1.0,
            ..ScoringParameters::default()
        };
        let result = score(&layers, &params, &*null_progress());
        assert!(matches!(result, Err(ScoringError::InvalidParameters(_))));
    }

    #[test]
    fn score_runs_over_layer_extent() {
        let mut layers = small_town();
        layers.mark_ready();
        let params = ScoringParameters {
            cell_size_km: 0.25,
            ..ScoringParameters::default()
        };

        let run = score(&layers, &params, &*null_progress()).unwrap();
        assert_eq!(run.cells.len(), run.grid.len());
        assert!(run.cells.iter().any(|c| !c.allowed));
        assert!(run.cells.iter().filter(|c| !c.allowed).all(|c| c.score.abs() < f64::EPSILON));
        assert!(run.cells.iter().all(|c| (0.0..=1.0).contains(&c.score)));

        let fc = run.to_feature_collection();
        assert_eq!(fc.len(), run.grid.len());
        assert!(fc.features[0].text("color").is_some());
        assert!(fc.features[0].number("lu_score").is_some());

        let snapshot = run.snapshot();
        assert!(snapshot.candidates.len() <= params.top_k);
        assert!(snapshot.candidates.iter().all(|c| c.score > 0.0));
    }
}
