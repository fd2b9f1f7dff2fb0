//! Point-in-polygon tests against polygon layers.
//!
//! Points on a polygon's boundary count as inside. Non-areal geometries in
//! a polygon layer never contain anything.

use geo::{Geometry, Intersects, Point};

use crate::FeatureCollection;
use crate::measure::is_finite_point;

/// Returns `true` if `geometry` is areal and `point` lies inside it or on
/// its boundary.
#[must_use]
pub fn polygon_contains(geometry: &Geometry<f64>, point: Point<f64>) -> bool {
    match geometry {
        Geometry::Polygon(p) => p.intersects(&point),
        Geometry::MultiPolygon(mp) => mp.intersects(&point),
        Geometry::Rect(r) => r.intersects(&point),
        Geometry::Triangle(t) => t.intersects(&point),
        Geometry::GeometryCollection(gc) => gc.iter().any(|g| polygon_contains(g, point)),
        _ => false,
    }
}

/// Index of the first feature (in collection order) whose polygon
/// contains `point`.
#[must_use]
pub fn first_containing(point: Point<f64>, collection: &FeatureCollection) -> Option<usize> {
    if !is_finite_point(point) {
        return None;
    }

    collection.iter().position(|f| {
        f.geometry
            .as_ref()
            .is_some_and(|g| polygon_contains(g, point))
    })
}

/// Returns `true` iff `point` falls inside at least one polygon of the
/// collection.
#[must_use]
pub fn point_in_any_polygon(point: Point<f64>, collection: &FeatureCollection) -> bool {
    first_containing(point, collection).is_some()
}
