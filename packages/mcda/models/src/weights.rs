//! Criterion weights and their normalization.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ComponentScores;

/// Number of scoring criteria.
pub const CRITERIA_COUNT: usize = 7;

/// What normalization does when every raw weight is zero.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum ZeroWeightPolicy {
    /// Keep every weight at zero, so every cell scores zero.
    #[default]
    AllZero,
    /// Fall back to equal weights of one seventh.
    Equal,
}

/// Raw, user-entered criterion weights. Each must be finite and
/// non-negative; they need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weights {
    /// Proximity to public Wi-Fi.
    pub wifi: f64,
    /// Proximity to (or distance from) amenities.
    pub amenity: f64,
    /// Road access.
    pub road: f64,
    /// Land-use suitability.
    pub land_use: f64,
    /// Building density.
    pub building: f64,
    /// Population density.
    pub population: f64,
    /// Industrial emitters.
    pub industrial: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Weights {
    /// Every criterion weighted `w`.
    #[must_use]
    pub const fn uniform(w: f64) -> Self {
        Self {
            wifi: w,
            amenity: w,
            road: w,
            land_use: w,
            building: w,
            population: w,
            industrial: w,
        }
    }

    /// Every criterion weighted zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self::uniform(0.0)
    }

    /// Weights in criterion order: wifi, amenity, road, land use,
    /// building, population, industrial.
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

    /// Sum of the raw weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Whether every weight is finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|w| w.is_finite() && *w >= 0.0)
    }

    /// Scales the weights to sum to one.
    ///
    /// A zero sum is resolved by `policy`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalize(&self, policy: ZeroWeightPolicy) -> NormalizedWeights {
        let sum = self.sum();
        if sum > 0.0 {
            return NormalizedWeights(self.scaled(sum.recip()));
        }

        match policy {
            ZeroWeightPolicy::AllZero => NormalizedWeights(Self::zero()),
            ZeroWeightPolicy::Equal => {
                NormalizedWeights(Self::uniform((CRITERIA_COUNT as f64).recip()))
            }
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            wifi: self.wifi * factor,
            amenity: self.amenity * factor,
            road: self.road * factor,
            land_use: self.land_use * factor,
            building: self.building * factor,
            population: self.population * factor,
            industrial: self.industrial * factor,
        }
    }
}

/// Weights that sum to one, or are all zero under
/// [`ZeroWeightPolicy::AllZero`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedWeights(Weights);

impl NormalizedWeights {
    /// The normalized values.
    #[must_use]
    pub const fn weights(&self) -> &Weights {
        &self.0
    }

    /// Sum of the normalized weights: one, or zero for an all-zero input.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    /// Whether every weight is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.to_array().iter().all(|w| *w == 0.0)
    }

    /// Weighted sum of component scores.
    #[must_use]
    pub fn apply(&self, components: &ComponentScores) -> f64 {
        self.0
            .to_array()
            .iter()
            .zip(components.to_array())
            .map(|(w, c)| w * c)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_weights_sum_to_one() {
        let raw = Weights {
            wifi: 3.0,
            amenity: 0.0,
            road: 1.0,
            land_use: 2.5,
            building: 0.5,
            population: 0.0,
            industrial: 1.0,
        };
        let normalized = raw.normalize(ZeroWeightPolicy::AllZero);
        assert!((normalized.sum() - 1.0).abs() < 1e-12);
        assert!((normalized.weights().wifi - 3.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn single_nonzero_weight_becomes_one() {
        let raw = Weights {
            wifi: 0.2,
            ..Weights::zero()
        };
        let normalized = raw.normalize(ZeroWeightPolicy::AllZero);
        assert!((normalized.weights().wifi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_policy_keeps_zero_weights() {
        let normalized = Weights::zero().normalize(ZeroWeightPolicy::AllZero);
        assert!(normalized.is_zero());
        assert!(normalized.sum().abs() < f64::EPSILON);
    }

    #[test]
    fn equal_policy_spreads_weight_evenly() {
        let normalized = Weights::zero().normalize(ZeroWeightPolicy::Equal);
        assert!((normalized.sum() - 1.0).abs() < 1e-12);
        assert!((normalized.weights().road - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn negative_or_nan_weights_are_invalid() {
        assert!(Weights::default().is_valid());
        assert!(
            !Weights {
                road: -1.0,
                ..Weights::default()
            }
            .is_valid()
        );
        assert!(
            !Weights {
                wifi: f64::NAN,
                ..Weights::default()
            }
            .is_valid()
        );
    }

    #[test]
    fn apply_is_a_dot_product() {
        let weights = Weights {
            wifi: 1.0,
            land_use: 1.0,
            ..Weights::zero()
        }
        .normalize(ZeroWeightPolicy::AllZero);
        let components = ComponentScores {
            wifi: 0.8,
            land_use: 0.4,
            ..ComponentScores::default()
        };
        assert!((weights.apply(&components) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn missing_weight_keys_default_to_one() {
        let weights: Weights = serde_json::from_str(r#"{"wifi": 2, "landUse": 0}"#).unwrap();
        assert!((weights.wifi - 2.0).abs() < f64::EPSILON);
        assert!(weights.land_use.abs() < f64::EPSILON);
        assert!((weights.road - 1.0).abs() < f64::EPSILON);
    }
}
