//! Land-use lookup at a point.
//!
//! A point takes the class of the first parcel polygon that contains it.
//! Points that fall in a gap between parcels take the class of the parcel
//! whose centroid is nearest, so every cell in the land-use extent gets a
//! real class rather than a neutral one.

use geo::Point;
use sitescore_geometry::{FeatureCollection, PolygonIndex, centroid_or_self, haversine_km};
use sitescore_landuse_models::LandUseClass;

use crate::classify::classify_feature;

/// Pre-classified, indexed land-use layer.
///
/// Every parcel is classified once when the lookup is built; lookups only
/// resolve which parcel applies.
#[derive(Debug)]
pub struct LandUseLookup {
    index: PolygonIndex,
    classes: Vec<LandUseClass>,
    centroids: Vec<(usize, Point<f64>)>,
}

impl LandUseLookup {
    /// Classifies and indexes every parcel in a normalized land-use layer.
    #[must_use]
    pub fn build(parcels: &FeatureCollection) -> Self {
        let classes: Vec<LandUseClass> = parcels.iter().map(classify_feature).collect();
        let centroids = parcels
            .iter()
            .enumerate()
            .filter_map(|(i, f)| centroid_or_self(f).map(|c| (i, c)))
            .collect();

        let classified = classes.iter().filter(|c| c.bucket.is_some()).count();
        log::info!(
            "Land-use lookup built: {} parcels, {classified} classified",
            classes.len()
        );

        Self {
            index: PolygonIndex::build(parcels),
            classes,
            centroids,
        }
    }

    /// Number of parcels in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the layer has no parcels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Land-use class at `point`.
    ///
    /// Same result as [`classify_at_point`] on the source layer.
    #[must_use]
    pub fn class_at(&self, point: Point<f64>) -> LandUseClass {
        if self.classes.is_empty() {
            return LandUseClass::no_polygons();
        }

        let hit = self
            .index
            .first_containing(point)
            .or_else(|| nearest_by_centroid(point, self.centroids.iter().copied()));

        hit.and_then(|i| self.classes.get(i).cloned())
            .unwrap_or_else(|| LandUseClass::unclassified("", ""))
    }
}

/// Land-use class at `point` by linear scan of `parcels`.
///
/// First containing polygon; else the parcel with the nearest centroid;
/// an empty layer yields the neutral "(no polygons)" class.
#[must_use]
pub fn classify_at_point(point: Point<f64>, parcels: &FeatureCollection) -> LandUseClass {
    if parcels.is_empty() {
        return LandUseClass::no_polygons();
    }

    let hit = sitescore_geometry::first_containing(point, parcels).or_else(|| {
        nearest_by_centroid(
            point,
            parcels
                .iter()
                .enumerate()
                .filter_map(|(i, f)| centroid_or_self(f).map(|c| (i, c))),
        )
    });

    hit.map_or_else(
        || LandUseClass::unclassified("", ""),
        |i| classify_feature(&parcels.features[i]),
    )
}

fn nearest_by_centroid(
    point: Point<f64>,
    centroids: impl Iterator<Item = (usize, Point<f64>)>,
) -> Option<usize> {
    if !(point.x().is_finite() && point.y().is_finite()) {
        return None;
    }

    centroids
        .map(|(i, c)| (i, haversine_km(point, c)))
        .filter(|(_, d)| d.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
