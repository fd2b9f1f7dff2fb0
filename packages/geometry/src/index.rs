//! R-tree indexes for the per-cell hot paths.
//!
//! Scoring asks the same polygon layers "which polygon contains this cell
//! center?" and the building layer "how many centroids are within this
//! radius?" once per hex cell. These indexes answer both without a linear
//! scan; results are identical to the linear definitions in
//! [`crate::containment`] and [`crate::distance`].

use geo::{BoundingRect, Geometry, Point};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree, RTreeObject};
use sitescore_geometry_models::KM_PER_DEGREE;

use crate::FeatureCollection;
use crate::containment::polygon_contains;
use crate::distance::haversine_km;
use crate::measure::{centroid_or_self, is_finite_point};

/// An areal feature stored in the R-tree with its position in the source
/// collection.
#[derive(Debug)]
struct PolygonEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
    geometry: Geometry<f64>,
}

impl RTreeObject for PolygonEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over the areal features of one layer.
///
/// Lookups return the position of the matching feature in the original
/// collection, so "first containing polygon" keeps its collection-order
/// meaning even though the tree itself is unordered.
#[derive(Debug)]
pub struct PolygonIndex {
    tree: RTree<PolygonEntry>,
}

impl PolygonIndex {
    /// Builds an index over every areal feature with a finite extent.
    /// Points, lines, and features without geometry are skipped.
    #[must_use]
    pub fn build(collection: &FeatureCollection) -> Self {
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for (index, feature) in collection.iter().enumerate() {
            let Some(geometry) = feature.geometry.as_ref() else {
                skipped += 1;
                continue;
            };
            if !matches!(
                geometry,
                Geometry::Polygon(_)
                    | Geometry::MultiPolygon(_)
                    | Geometry::Rect(_)
                    | Geometry::Triangle(_)
                    | Geometry::GeometryCollection(_)
            ) {
                skipped += 1;
                continue;
            }
            let Some(envelope) = compute_envelope(geometry) else {
                log::warn!("Skipping polygon {index} with no finite extent");
                skipped += 1;
                continue;
            };

            entries.push(PolygonEntry {
                index,
                envelope,
                geometry: geometry.clone(),
            });
        }

        if skipped > 0 {
            log::debug!("Polygon index skipped {skipped} non-areal or empty features");
        }

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no polygons were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Collection index of the first polygon containing `point`.
    #[must_use]
    pub fn first_containing(&self, point: Point<f64>) -> Option<usize> {
        if !is_finite_point(point) {
            return None;
        }

        let query_env = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| polygon_contains(&entry.geometry, point))
            .map(|entry| entry.index)
            .min()
    }

    /// Returns `true` if any indexed polygon contains `point`.
    #[must_use]
    pub fn contains(&self, point: Point<f64>) -> bool {
        if !is_finite_point(point) {
            return false;
        }

        let query_env = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .any(|entry| polygon_contains(&entry.geometry, point))
    }
}

/// Spatial index over point locations for fixed-radius counts.
#[derive(Debug)]
pub struct PointIndex {
    tree: RTree<GeomWithData<[f64; 2], usize>>,
}

impl PointIndex {
    /// Builds an index over the given points, skipping non-finite ones.
    #[must_use]
    pub fn new(points: impl IntoIterator<Item = Point<f64>>) -> Self {
        let entries = points
            .into_iter()
            .filter(|p| is_finite_point(*p))
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x(), p.y()], i))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Builds an index over the representative point of every feature.
    #[must_use]
    pub fn from_collection(collection: &FeatureCollection) -> Self {
        Self::new(collection.iter().filter_map(centroid_or_self))
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no points were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Counts indexed points within `radius_km` (great-circle) of `center`.
    #[must_use]
    pub fn count_within_km(&self, center: Point<f64>, radius_km: f64) -> usize {
        if !is_finite_point(center) || radius_km.is_nan() || radius_km <= 0.0 {
            return 0;
        }

        let dlat = radius_km / KM_PER_DEGREE;
        let cos_lat = center.y().to_radians().cos();
        let dlon = if cos_lat > 1e-6 {
            (radius_km / (KM_PER_DEGREE * cos_lat)).min(180.0)
        } else {
            180.0
        };

        let envelope = AABB::from_corners(
            [center.x() - dlon, center.y() - dlat],
            [center.x() + dlon, center.y() + dlat],
        );

        self.tree
            .locate_in_envelope(&envelope)
            .filter(|entry| {
                let [x, y] = *entry.geom();
                haversine_km(center, Point::new(x, y)) <= radius_km
            })
            .count()
    }
}

/// Compute the bounding box envelope for a geometry.
fn compute_envelope(geometry: &Geometry<f64>) -> Option<AABB<[f64; 2]>> {
    let rect = geometry.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    [min.x, min.y, max.x, max.y]
        .iter()
        .all(|v| v.is_finite())
        .then(|| AABB::from_corners([min.x, min.y], [max.x, max.y]))
}
