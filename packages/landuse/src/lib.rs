#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land-use classification.
//!
//! Maps free-text zoning descriptions and zoning codes onto the six
//! [`LandUseBucket`]s and their suitability sub-scores, and resolves the
//! class of the parcel under any point of the map.

pub mod classify;
pub mod lookup;
pub mod normalize;

pub use classify::{bucket_for_zone, classify, classify_description, classify_feature};
pub use lookup::{LandUseLookup, classify_at_point};
pub use sitescore_landuse_models::{LandUseBucket, LandUseClass};

/// Lowest sub-score on the display ramp (Park/Open Space).
const RAMP_FLOOR: f64 = 0.4;
/// Sub-score span covered by the display ramp.
const RAMP_SPAN: f64 = 0.5;

/// Fill hue (degrees) for a land-use sub-score.
///
/// Low scores render blue (210) and high scores render orange (50).
#[must_use]
pub fn display_hue(score: f64) -> f64 {
    let t = if score.is_finite() {
        ((score - RAMP_FLOOR) / RAMP_SPAN).clamp(0.0, 1.0)
    } else {
        0.0
    };
    160.0f64.mul_add(-t, 210.0)
}

/// CSS color for a land-use sub-score.
#[must_use]
pub fn display_color(score: f64) -> String {
    format!("hsl({:.0}, 60%, 70%)", display_hue(score))
}
