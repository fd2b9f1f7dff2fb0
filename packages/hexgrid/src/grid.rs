//! Grid generation.

use geo::{Centroid, Coord, Intersects, LineString, Point, Polygon, Rect};
use sitescore_geometry::{Feature, FeatureCollection};
use sitescore_geometry_models::BoundingBox;

use crate::HexGridError;
use crate::frame::LocalFrame;

/// Upper bound on the number of cells in one grid.
pub const MAX_CELLS: usize = 250_000;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// One hexagonal cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    /// Column index; odd columns are shifted up by half a row.
    pub column: i64,
    /// Row index within the column.
    pub row: i64,
    /// Center of mass of [`HexCell::polygon`].
    pub center: Point<f64>,
    /// Closed hexagon ring in lon/lat.
    pub polygon: Polygon<f64>,
}

impl HexCell {
    /// The cell as a polygon feature with its grid indices.
    #[must_use]
    pub fn to_feature(&self) -> Feature {
        Feature::new(geo::Geometry::Polygon(self.polygon.clone()))
            .with_property("column", self.column)
            .with_property("row", self.row)
    }
}

/// A complete tiling of a bounding box.
#[derive(Debug, Clone)]
pub struct HexGrid {
    edge_km: f64,
    bbox: BoundingBox,
    cells: Vec<HexCell>,
}

impl HexGrid {
    /// Tiles `bbox` with flat-topped hexagons of edge `edge_km`.
    ///
    /// Cells are ordered column-major (west to east, then south to north
    /// within a column). Only cells overlapping the box are kept.
    ///
    /// # Errors
    ///
    /// * [`HexGridError::InvalidEdge`] if `edge_km` is not a positive finite
    ///   number
    /// * [`HexGridError::InvalidBoundingBox`] if the box is not finite or
    ///   has no area
    /// * [`HexGridError::TooManyCells`] if the tiling would exceed
    ///   [`MAX_CELLS`]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn generate(bbox: BoundingBox, edge_km: f64) -> Result<Self, HexGridError> {
        if !edge_km.is_finite() || edge_km <= 0.0 {
            return Err(HexGridError::InvalidEdge { edge_km });
        }
        if !bbox.is_valid() {
            return Err(HexGridError::InvalidBoundingBox {
                message: format!("{bbox:?}"),
            });
        }

        let frame = LocalFrame::new(bbox.center());
        let min = frame.to_km(bbox.min_lon, bbox.min_lat);
        let max = frame.to_km(bbox.max_lon, bbox.max_lat);
        let extent = Rect::new(min, max);

        let dx = 1.5 * edge_km;
        let dy = SQRT_3 * edge_km;
        let half_height = dy / 2.0;

        let last_column = ((max.x - min.x) / dx).ceil() + 1.0;
        let last_row = ((max.y - min.y) / dy).ceil() + 1.0;
        let estimated = (last_column + 2.0) * (last_row + 2.0);
        if !estimated.is_finite() || estimated > MAX_CELLS as f64 {
            return Err(HexGridError::TooManyCells {
                estimated: if estimated.is_finite() {
                    estimated as u64
                } else {
                    u64::MAX
                },
                max: MAX_CELLS,
            });
        }
        let last_column = last_column as i64;
        let last_row = last_row as i64;

        let mut cells = Vec::new();
        for column in -1..=last_column {
            let cx = (column as f64).mul_add(dx, min.x);
            let shift = if column.rem_euclid(2) == 1 {
                half_height
            } else {
                0.0
            };

            if cx + edge_km <= min.x || cx - edge_km >= max.x {
                continue;
            }

            for row in -1..=last_row {
                let cy = (row as f64).mul_add(dy, min.y) + shift;
                if cy + half_height <= min.y || cy - half_height >= max.y {
                    continue;
                }

                let hexagon = hexagon_km(Coord { x: cx, y: cy }, edge_km);
                if !hexagon.intersects(&extent) {
                    continue;
                }

                let polygon = Polygon::new(
                    hexagon
                        .exterior()
                        .coords()
                        .map(|c| frame.to_lonlat(*c))
                        .collect::<LineString<f64>>(),
                    vec![],
                );
                let center = polygon
                    .centroid()
                    .unwrap_or_else(|| Point::from(frame.to_lonlat(Coord { x: cx, y: cy })));

                cells.push(HexCell {
                    column,
                    row,
                    center,
                    polygon,
                });
            }
        }

        log::info!(
            "Hex grid: {} cells of {edge_km} km edge over {:.4}x{:.4} degrees",
            cells.len(),
            bbox.width(),
            bbox.height()
        );

        Ok(Self {
            edge_km,
            bbox,
            cells,
        })
    }

    /// Edge length in kilometres.
    #[must_use]
    pub const fn edge_km(&self) -> f64 {
        self.edge_km
    }

    /// The box this grid covers.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Area of every cell in the local frame, in square kilometres.
    #[must_use]
    pub const fn cell_area_km2(&self) -> f64 {
        1.5 * SQRT_3 * self.edge_km * self.edge_km
    }

    /// Cells in column-major order.
    #[must_use]
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// Consumes the grid, returning its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<HexCell> {
        self.cells
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over the cells.
    pub fn iter(&self) -> std::slice::Iter<'_, HexCell> {
        self.cells.iter()
    }

    /// All cells as polygon features.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        self.cells.iter().map(HexCell::to_feature).collect()
    }
}

/// Tiles `bbox` with hexagons of edge `edge_km`. See [`HexGrid::generate`].
///
/// # Errors
///
/// Returns [`HexGridError`] for an invalid edge length or bounding box, or
/// a grid that would be too large.
pub fn generate(bbox: BoundingBox, edge_km: f64) -> Result<HexGrid, HexGridError> {
    HexGrid::generate(bbox, edge_km)
}

/// Flat-topped hexagon with vertices at 0°, 60°, …, 300° around `center`.
fn hexagon_km(center: Coord<f64>, edge_km: f64) -> Polygon<f64> {
    let half_height = SQRT_3 * edge_km / 2.0;
    let half_edge = edge_km / 2.0;
    let ring = vec![
        Coord {
            x: center.x + edge_km,
            y: center.y,
        },
        Coord {
            x: center.x + half_edge,
            y: center.y + half_height,
        },
        Coord {
            x: center.x - half_edge,
            y: center.y + half_height,
        },
        Coord {
            x: center.x - edge_km,
            y: center.y,
        },
        Coord {
            x: center.x - half_edge,
            y: center.y - half_height,
        },
        Coord {
            x: center.x + half_edge,
            y: center.y - half_height,
        },
    ];
    Polygon::new(LineString::from(ring), vec![])
}

#[cfg(test)]
mod tests {
    use geo::{Area, Contains, MapCoords};

    use super::*;

    fn edmonton() -> BoundingBox {
        BoundingBox::new(-113.60, 53.45, -113.40, 53.60)
    }

    #[test]
    fn rejects_invalid_edges() {
        for edge in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                generate(edmonton(), edge),
                Err(HexGridError::InvalidEdge { .. })
            ));
        }
    }

    #[test]
    fn rejects_degenerate_boxes() {
        for bbox in [
            BoundingBox::new(-113.5, 53.5, -113.5, 53.6),
            BoundingBox::new(-113.4, 53.5, -113.5, 53.6),
            BoundingBox::new(f64::NAN, 53.5, -113.5, 53.6),
        ] {
            assert!(matches!(
                generate(bbox, 0.5),
                Err(HexGridError::InvalidBoundingBox { .. })
            ));
        }
    }

    #[test]
    fn rejects_oversized_grids() {
        assert!(matches!(
            generate(BoundingBox::new(-120.0, 49.0, -110.0, 60.0), 0.01),
            Err(HexGridError::TooManyCells { .. })
        ));
    }

    #[test]
    fn every_point_in_box_is_in_exactly_one_cell() {
        let bbox = edmonton();
        let grid = generate(bbox, 0.5).unwrap();
        assert!(!grid.is_empty());

        let steps = 37;
        for i in 0..steps {
            for j in 0..steps {
                let fx = (f64::from(i) + 0.318) / f64::from(steps);
                let fy = (f64::from(j) + 0.577) / f64::from(steps);
                let p = Point::new(
                    fx.mul_add(bbox.width(), bbox.min_lon),
                    fy.mul_add(bbox.height(), bbox.min_lat),
                );
                let hits = grid.iter().filter(|c| c.polygon.contains(&p)).count();
                assert_eq!(hits, 1, "point {p:?} in {hits} cells");
            }
        }
    }

    #[test]
    fn cells_are_congruent_in_local_frame() {
        let bbox = edmonton();
        let grid = generate(bbox, 0.5).unwrap();
        let frame = LocalFrame::new(bbox.center());
        let expected = grid.cell_area_km2();

        for cell in grid.iter() {
            let km = cell.polygon.map_coords(|c| frame.to_km(c.x, c.y));
            assert!((km.unsigned_area() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn centers_sit_inside_their_cells() {
        let grid = generate(edmonton(), 1.0).unwrap();
        assert!(grid.iter().all(|c| c.polygon.contains(&c.center)));
    }

    #[test]
    fn order_is_column_major_and_deterministic() {
        let a = generate(edmonton(), 0.75).unwrap();
        let b = generate(edmonton(), 0.75).unwrap();
        assert_eq!(a.cells(), b.cells());
        assert!(
            a.cells()
                .windows(2)
                .all(|w| (w[0].column, w[0].row) < (w[1].column, w[1].row))
        );
    }

    #[test]
    fn every_cell_touches_the_box() {
        let bbox = edmonton();
        let grid = generate(bbox, 0.5).unwrap();
        let pad = 1e-9;
        let extent = Rect::new(
            Coord {
                x: bbox.min_lon - pad,
                y: bbox.min_lat - pad,
            },
            Coord {
                x: bbox.max_lon + pad,
                y: bbox.max_lat + pad,
            },
        );
        assert!(grid.iter().all(|c| c.polygon.intersects(&extent)));
    }

    #[test]
    fn features_carry_indices() {
        let grid = generate(edmonton(), 2.0).unwrap();
        let fc = grid.to_feature_collection();
        assert_eq!(fc.len(), grid.len());
        assert!(fc.features[0].number("column").is_some());
    }
}
