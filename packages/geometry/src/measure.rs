//! Centroids, areas, and extents.

use geo::{BoundingRect, Centroid, CoordsIter, GeodesicArea, Geometry, Point};
use sitescore_geometry_models::{BoundingBox, fields};

use crate::{Feature, FeatureCollection};

/// Returns the point that stands in for a geometry in distance queries:
/// the point itself, or the area-weighted centroid of anything else.
#[must_use]
pub fn representative_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    let point = match geometry {
        Geometry::Point(p) => *p,
        other => other.centroid()?,
    };
    is_finite_point(point).then_some(point)
}

/// Returns the feature's own coordinates if it is a point, otherwise its
/// centroid. `None` for features without a usable geometry.
#[must_use]
pub fn centroid_or_self(feature: &Feature) -> Option<Point<f64>> {
    representative_point(feature.geometry.as_ref()?)
}

/// Reduces a feature to a point feature at its centroid, keeping its
/// attributes.
#[must_use]
pub fn centroid_feature(feature: &Feature) -> Option<Feature> {
    let point = centroid_or_self(feature)?;
    Some(Feature {
        geometry: Some(Geometry::Point(point)),
        properties: feature.properties.clone(),
    })
}

/// Area of a feature in square kilometres.
///
/// A positive precomputed [`fields::AREA_M2`] attribute wins over the
/// geodesic area of the geometry, matching the upstream data provenance.
/// Returns `0.0` when neither is available.
#[must_use]
pub fn area_km2(feature: &Feature) -> f64 {
    if let Some(m2) = feature.number(fields::AREA_M2)
        && m2 > 0.0
    {
        return m2 / 1e6;
    }

    feature.geometry.as_ref().map_or(0.0, geodesic_area_km2)
}

/// Geodesic area of a geometry in square kilometres, or `0.0` for
/// non-areal or malformed geometries.
#[must_use]
pub fn geodesic_area_km2(geometry: &Geometry<f64>) -> f64 {
    if !geometry.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        log::debug!("Skipping area of geometry with non-finite coordinates");
        return 0.0;
    }

    let m2 = geometry.geodesic_area_unsigned();
    if m2.is_finite() && m2 > 0.0 {
        m2 / 1e6
    } else {
        0.0
    }
}

/// Combined extent of every geometry in the collection.
///
/// Returns `None` if no feature has a finite, non-empty extent.
#[must_use]
pub fn bounding_box(collection: &FeatureCollection) -> Option<BoundingBox> {
    collection
        .iter()
        .filter_map(|f| f.geometry.as_ref()?.bounding_rect())
        .map(|rect| {
            BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
        })
        .filter(|b| {
            [b.min_lon, b.min_lat, b.max_lon, b.max_lat]
                .iter()
                .all(|v| v.is_finite())
        })
        .reduce(BoundingBox::union)
}

pub(crate) fn is_finite_point(point: Point<f64>) -> bool {
    point.x().is_finite() && point.y().is_finite()
}
