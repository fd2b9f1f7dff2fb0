#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry utilities for suitability layers.
//!
//! Every scoring layer is held as a [`FeatureCollection`]: an ordered list
//! of [`Feature`]s, each a `geo` geometry plus an open attribute map. This
//! crate provides the measurements the scoring engine takes against those
//! layers (nearest-feature and nearest-line distances, polygon
//! containment, centroids, and areas) and R-tree indexes for the hot
//! containment and radius queries.
//!
//! None of the measurement functions fail. Malformed or missing
//! geometries degrade to a safe default (the [`UNREACHABLE_KM`] sentinel,
//! `false`, or `0.0`) and are logged, so one bad polygon never aborts a
//! scoring run.

pub mod containment;
pub mod distance;
pub mod feature;
pub mod index;
pub mod measure;

pub use containment::{first_containing, point_in_any_polygon};
pub use distance::{
    UNREACHABLE_KM, distance_to_nearest_feature, distance_to_nearest_line, haversine_km,
};
pub use feature::{Feature, FeatureCollection, Properties, coerce_f64};
pub use index::{PointIndex, PolygonIndex};
pub use measure::{area_km2, bounding_box, centroid_feature, centroid_or_self};

use thiserror::Error;

/// Errors that can occur while reading geometry input.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input parsed but was not a shape this crate can use.
    #[error("Unsupported GeoJSON: {message}")]
    Unsupported {
        /// Description of what was found.
        message: String,
    },
}
