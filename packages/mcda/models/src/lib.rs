#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scoring parameters and result types for the suitability engine.
//!
//! [`ScoringParameters`] is the immutable configuration of one run. The
//! engine produces a [`ScoredCell`] per hex cell; the best allowed cells
//! become [`Candidate`]s inside a [`Snapshot`], the record handed to
//! export and rendering.

pub mod weights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitescore_geometry_models::{BoundingBox, LonLat};
use strum_macros::{AsRefStr, Display, EnumString};

pub use weights::{CRITERIA_COUNT, NormalizedWeights, Weights, ZeroWeightPolicy};

/// Neutral component value used when a measurement is unavailable.
pub const NEUTRAL_COMPONENT: f64 = 0.5;

/// Whether the site should be near people and amenities or away from them.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Favor amenities and dense population.
    #[default]
    Exposure,
    /// Favor distance from amenities and sparse population.
    Avoidance,
}

/// Direction of a distance criterion.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Preference {
    /// Shorter distances score higher.
    Closer,
    /// Longer distances score higher.
    Farther,
}

impl Preference {
    /// Maps a distance to `[0, 1]` against `max_km`.
    ///
    /// Non-finite results (e.g. a non-positive `max_km`) clamp to zero.
    #[must_use]
    pub fn score(self, distance_km: f64, max_km: f64) -> f64 {
        let ratio = distance_km / max_km;
        let raw = match self {
            Self::Closer => 1.0 - ratio,
            Self::Farther => ratio,
        };
        clamp_unit(raw)
    }
}

/// Clamps to `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct InvalidParameter {
    /// The offending field, by its serialized name.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

/// Configuration of one scoring run.
///
/// Deserializes from camelCase keys; any missing key takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringParameters {
    /// Hexagon edge length in km.
    pub cell_size_km: f64,
    /// Distance at which a distance criterion saturates, in km.
    #[serde(alias = "dMax")]
    pub max_distance_km: f64,
    /// Exposure or avoidance.
    pub mode: Mode,
    /// Road direction.
    #[serde(alias = "roadsPref")]
    pub roads_preference: Preference,
    /// Industrial emitter direction.
    #[serde(alias = "industryPref")]
    pub industry_preference: Preference,
    /// Veto cells whose center lies in an exclusion zone.
    #[serde(alias = "excludePEMU")]
    pub exclude_pemu: bool,
    /// Raw criterion weights.
    pub weights: Weights,
    /// Radius of the building count disc, in km.
    pub building_radius_km: f64,
    /// Number of candidates kept in a snapshot.
    pub top_k: usize,
    /// Resolution of an all-zero weight vector.
    pub zero_weight_policy: ZeroWeightPolicy,
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self {
            cell_size_km: 0.5,
            max_distance_km: 2.0,
            mode: Mode::Exposure,
            roads_preference: Preference::Closer,
            industry_preference: Preference::Farther,
            exclude_pemu: true,
            weights: Weights::default(),
            building_radius_km: 0.1,
            top_k: 10,
            zero_weight_policy: ZeroWeightPolicy::AllZero,
        }
    }
}

impl ScoringParameters {
    /// Checks every numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidParameter`] found.
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        positive("cellSizeKm", self.cell_size_km)?;
        positive("maxDistanceKm", self.max_distance_km)?;
        positive("buildingRadiusKm", self.building_radius_km)?;
        if !self.weights.is_valid() {
            return Err(InvalidParameter {
                field: "weights",
                message: format!("every weight must be finite and >= 0, got {:?}", self.weights),
            });
        }
        Ok(())
    }

    /// Weights scaled to sum to one under the configured policy.
    #[must_use]
    pub fn normalized_weights(&self) -> NormalizedWeights {
        self.weights.normalize(self.zero_weight_policy)
    }

    /// Direction of the amenity criterion, which follows the mode.
    #[must_use]
    pub const fn amenity_preference(&self) -> Preference {
        match self.mode {
            Mode::Exposure => Preference::Closer,
            Mode::Avoidance => Preference::Farther,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), InvalidParameter> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidParameter {
            field,
            message: format!("must be a positive number, got {value}"),
        })
    }
}

/// The seven normalized criteria of one cell, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    /// Wi-Fi proximity.
    pub wifi: f64,
    /// Amenity proximity or distance, per mode.
    pub amenity: f64,
    /// Road criterion.
    pub road: f64,
    /// Land-use sub-score.
    pub land_use: f64,
    /// Building density relative to the densest cell.
    pub building: f64,
    /// Population density, per mode.
    pub population: f64,
    /// Industrial emitter criterion.
    pub industrial: f64,
}

impl ComponentScores {
    /// Scores in the same criterion order as [`Weights::to_array`].
    #[must_use]
    pub const fn to_array(&self) -> [f64; CRITERIA_COUNT] {
        [
            self.wifi,
            self.amenity,
            self.road,
            self.land_use,
            self.building,
            self.population,
            self.industrial,
        ]
    }

    /// Whether every component lies in `[0, 1]`.
    #[must_use]
    pub fn in_unit_range(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }
}

/// The measurements one cell was scored from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeasurements {
    /// Distance to the nearest Wi-Fi point, km.
    pub wifi_km: f64,
    /// Distance to the nearest amenity, km.
    pub amenity_km: f64,
    /// Distance to the nearest road, km.
    pub road_km: f64,
    /// Distance to the nearest industrial emitter, km.
    pub industry_km: f64,
    /// Building centroids within the building radius.
    pub building_count: usize,
    /// Land-use bucket label.
    pub land_use_label: String,
    /// Land-use sub-score.
    pub land_use_score: f64,
    /// People per km², `None` outside census coverage.
    pub population_density: Option<f64>,
}

/// One scored hex cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCell {
    /// Position in grid order.
    pub index: usize,
    /// Cell center.
    pub center: LonLat,
    /// What was measured.
    pub raw: RawMeasurements,
    /// Normalized criteria.
    pub components: ComponentScores,
    /// Weighted sum, or zero when vetoed.
    pub score: f64,
    /// `false` when the center lies in an exclusion zone and exclusion is
    /// enabled.
    pub allowed: bool,
}

/// A ranked cell in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// 1-based rank.
    pub rank: usize,
    /// Cell center.
    pub center: LonLat,
    /// Final score.
    pub score: f64,
    /// Normalized criteria.
    pub components: ComponentScores,
    /// What was measured.
    pub raw: RawMeasurements,
}

/// The parameters recorded with a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParameters {
    /// Exposure or avoidance.
    pub mode: Mode,
    /// Road direction.
    pub roads_preference: Preference,
    /// Industrial emitter direction.
    pub industry_preference: Preference,
    /// Whether exclusion zones vetoed cells.
    pub exclude_pemu: bool,
    /// Hexagon edge length, km.
    pub cell_size_km: f64,
    /// Saturation distance, km.
    pub max_distance_km: f64,
    /// Weights as applied.
    pub weights_normalized: NormalizedWeights,
}

impl From<&ScoringParameters> for SnapshotParameters {
    fn from(params: &ScoringParameters) -> Self {
        Self {
            mode: params.mode,
            roads_preference: params.roads_preference,
            industry_preference: params.industry_preference,
            exclude_pemu: params.exclude_pemu,
            cell_size_km: params.cell_size_km,
            max_distance_km: params.max_distance_km,
            weights_normalized: params.normalized_weights(),
        }
    }
}

/// The record of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// When the run finished.
    pub when: DateTime<Utc>,
    /// Parameters the run used.
    pub parameters: SnapshotParameters,
    /// Best allowed cells, best first.
    pub candidates: Vec<Candidate>,
    /// Extent the grid covered.
    pub bbox: BoundingBox,
}
