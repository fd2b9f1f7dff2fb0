#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land-use bucket taxonomy.
//!
//! Every zoning district, however it is described upstream, is folded into
//! one of six [`LandUseBucket`]s, each carrying a fixed suitability
//! sub-score. Parcels that cannot be classified get a neutral score.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sub-score assigned to parcels that match no bucket.
pub const NEUTRAL_SCORE: f64 = 0.50;

/// Label for parcels that match no bucket.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// Label used when the land-use layer has no polygons at all.
pub const NO_POLYGONS_LABEL: &str = "(no polygons)";

/// The six land-use classes used for suitability scoring.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum LandUseBucket {
    /// Heavy, medium, and light industrial districts.
    Industrial,
    /// Commercial districts including the town-centre district.
    Commercial,
    /// Institutional, public-service, and mixed-institutional districts.
    Institutional,
    /// All residential districts.
    Residential,
    /// Parks, open space, and conservation.
    #[serde(rename = "Park/Open Space")]
    #[strum(serialize = "Park/Open Space")]
    ParkOpenSpace,
    /// Agricultural and rural districts.
    Agriculture,
}

impl LandUseBucket {
    /// Suitability sub-score for this bucket.
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::Industrial => 0.90,
            Self::Commercial => 0.80,
            Self::Institutional => 0.75,
            Self::Residential => 0.60,
            Self::Agriculture => 0.50,
            Self::ParkOpenSpace => 0.40,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Industrial,
            Self::Commercial,
            Self::Institutional,
            Self::Residential,
            Self::ParkOpenSpace,
            Self::Agriculture,
        ]
    }
}

/// The outcome of classifying one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandUseClass {
    /// Matched bucket, or `None` when unclassified.
    pub bucket: Option<LandUseBucket>,
    /// Suitability sub-score.
    pub score: f64,
    /// Display label (bucket name, or a neutral label).
    pub label: String,
    /// Raw zoning code as it appeared upstream, kept for diagnostics.
    pub zone: String,
    /// Raw zoning description as it appeared upstream.
    pub description: String,
}

impl LandUseClass {
    /// A classified parcel.
    #[must_use]
    pub fn classified(bucket: LandUseBucket, zone: &str, description: &str) -> Self {
        Self {
            bucket: Some(bucket),
            score: bucket.score(),
            label: bucket.to_string(),
            zone: zone.to_string(),
            description: description.to_string(),
        }
    }

    /// A parcel that matched no bucket.
    #[must_use]
    pub fn unclassified(zone: &str, description: &str) -> Self {
        Self {
            bucket: None,
            score: NEUTRAL_SCORE,
            label: UNCLASSIFIED_LABEL.to_string(),
            zone: zone.to_string(),
            description: description.to_string(),
        }
    }

    /// The neutral result for a lookup against an empty layer.
    #[must_use]
    pub fn no_polygons() -> Self {
        Self {
            bucket: None,
            score: NEUTRAL_SCORE,
            label: NO_POLYGONS_LABEL.to_string(),
            zone: String::new(),
            description: String::new(),
        }
    }
}
