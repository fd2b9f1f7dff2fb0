//! Local equirectangular kilometre frame.

use geo::Coord;
use sitescore_geometry_models::{KM_PER_DEGREE, LonLat};

/// Maps lon/lat degrees to kilometres east and north of an origin, with
/// longitude scaled by the cosine of the origin latitude.
///
/// The mapping is affine, so straight edges and centroids carry over
/// exactly between the two frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: LonLat,
    km_per_lon: f64,
}

impl LocalFrame {
    /// Creates a frame anchored at `origin`.
    #[must_use]
    pub fn new(origin: LonLat) -> Self {
        Self {
            origin,
            km_per_lon: KM_PER_DEGREE * origin.lat.to_radians().cos(),
        }
    }

    /// The anchor point.
    #[must_use]
    pub const fn origin(&self) -> LonLat {
        self.origin
    }

    /// Degrees to local kilometres.
    #[must_use]
    pub fn to_km(&self, lon: f64, lat: f64) -> Coord<f64> {
        Coord {
            x: (lon - self.origin.lon) * self.km_per_lon,
            y: (lat - self.origin.lat) * KM_PER_DEGREE,
        }
    }

    /// Local kilometres to degrees (`x` is longitude).
    #[must_use]
    pub fn to_lonlat(&self, km: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.lon + km.x / self.km_per_lon,
            y: self.origin.lat + km.y / KM_PER_DEGREE,
        }
    }
}
