//! Nearest-feature distances in kilometres.
//!
//! Point-to-point distances are great-circle (haversine) on the mean-radius
//! sphere. Point-to-line distances project the line into a local
//! equirectangular frame centered on the query point, which is accurate to
//! well under a metre at the few-kilometre ranges the scoring engine cares
//! about.

use geo::{Closest, ClosestPoint, Coord, Distance, Geometry, Haversine, MapCoords, Point};
use sitescore_geometry_models::KM_PER_DEGREE;

use crate::FeatureCollection;
use crate::measure::{is_finite_point, representative_point};

/// Distance returned when a layer has nothing to measure against.
///
/// Callers must treat this as "effectively unreachable", never as a real
/// measurement.
pub const UNREACHABLE_KM: f64 = 999.0;

/// Great-circle distance between two lon/lat points in kilometres.
#[must_use]
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b) / 1000.0
}

/// Minimum distance from `point` to any feature's representative point
/// (the point itself, or the centroid of a line/polygon).
///
/// Returns [`UNREACHABLE_KM`] for an empty collection, a non-finite query
/// point, or a collection with no usable geometry.
#[must_use]
pub fn distance_to_nearest_feature(point: Point<f64>, collection: &FeatureCollection) -> f64 {
    if collection.is_empty() || !is_finite_point(point) {
        return UNREACHABLE_KM;
    }

    collection
        .iter()
        .filter_map(|f| representative_point(f.geometry.as_ref()?))
        .map(|p| haversine_km(point, p))
        .fold(None, |min: Option<f64>, d| Some(min.map_or(d, |m| m.min(d))))
        .unwrap_or(UNREACHABLE_KM)
}

/// Minimum distance from `point` to any line in the collection.
///
/// `LineString` and `MultiLineString` features are measured perpendicular
/// to their segments; any other geometry falls back to its
/// representative point. Same sentinel rules as
/// [`distance_to_nearest_feature`].
#[must_use]
pub fn distance_to_nearest_line(point: Point<f64>, collection: &FeatureCollection) -> f64 {
    if collection.is_empty() || !is_finite_point(point) {
        return UNREACHABLE_KM;
    }

    collection
        .iter()
        .filter_map(|f| {
            let geometry = f.geometry.as_ref()?;
            match geometry {
                Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                    line_distance_km(point, geometry)
                }
                other => representative_point(other).map(|p| haversine_km(point, p)),
            }
        })
        .fold(None, |min: Option<f64>, d| Some(min.map_or(d, |m| m.min(d))))
        .unwrap_or(UNREACHABLE_KM)
}

/// Perpendicular distance from `point` to a linear geometry, measured in a
/// local kilometre frame with `point` at the origin.
fn line_distance_km(point: Point<f64>, line: &Geometry<f64>) -> Option<f64> {
    let lon0 = point.x();
    let lat0 = point.y();
    let kx = KM_PER_DEGREE * lat0.to_radians().cos();

    let local = line.map_coords(|c| Coord {
        x: (c.x - lon0) * kx,
        y: (c.y - lat0) * KM_PER_DEGREE,
    });

    let origin = Point::new(0.0, 0.0);
    let nearest = match local.closest_point(&origin) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => p,
        Closest::Indeterminate => {
            log::debug!("Indeterminate closest point on line geometry");
            return None;
        }
    };

    let d = nearest.x().hypot(nearest.y());
    d.is_finite().then_some(d)
}
