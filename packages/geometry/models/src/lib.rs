#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared geographic value types.
//!
//! Defines the plain serializable types (coordinates, bounding boxes) that
//! cross crate boundaries, plus the canonical attribute names that every
//! normalized layer uses. Upstream field-name variants are resolved to
//! these names once, during layer normalization.

use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude on the mean-radius sphere
/// (`6371.0088 * PI / 180`).
pub const KM_PER_DEGREE: f64 = 111.194_926_644_558_73;

/// Canonical attribute names written by the layer normalizer.
pub mod fields {
    /// Total population of a census area.
    pub const POPULATION: &str = "population";
    /// Precomputed area in square metres, when the upstream source has one.
    pub const AREA_M2: &str = "area_m2";
    /// Population per square kilometre.
    pub const DENSITY: &str = "density";
    /// Raw zoning code of a land-use parcel.
    pub const ZONE: &str = "zone";
    /// Raw zoning description of a land-use parcel.
    pub const DESCRIPTION: &str = "description";
    /// Origin tag for display-only point layers (`station`, `purpleair`, `npri`).
    pub const SOURCE_TYPE: &str = "source_type";
}

/// A longitude/latitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// An axis-aligned extent in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Western edge (minimum longitude).
    pub min_lon: f64,
    /// Southern edge (minimum latitude).
    pub min_lat: f64,
    /// Eastern edge (maximum longitude).
    pub max_lon: f64,
    /// Northern edge (maximum latitude).
    pub max_lat: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its four edges.
    #[must_use]
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Width in degrees of longitude.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Geometric center of the box.
    #[must_use]
    pub fn center(&self) -> LonLat {
        LonLat::new(
            f64::midpoint(self.min_lon, self.max_lon),
            f64::midpoint(self.min_lat, self.max_lat),
        )
    }

    /// Returns `true` if the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: LonLat) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    /// Returns `true` if every edge is finite and the box has positive
    /// width and height.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Grows this box to include `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}
