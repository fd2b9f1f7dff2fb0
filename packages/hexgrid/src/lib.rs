#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hexagonal analysis grid.
//!
//! Tiles a lon/lat bounding box with flat-topped hexagons of a fixed edge
//! length in kilometres. The tiling is laid out in a local equirectangular
//! kilometre frame anchored at the box's center latitude, so every cell is
//! congruent (and equal in area) in that frame, and the cells cover the
//! box without gaps or overlaps.

mod frame;
mod grid;

pub use frame::LocalFrame;
pub use grid::{HexCell, HexGrid, MAX_CELLS, generate};

/// Errors that can occur while generating a grid.
#[derive(Debug, thiserror::Error)]
pub enum HexGridError {
    /// Edge length was zero, negative, or not finite.
    #[error("Invalid cell edge length: {edge_km} km")]
    InvalidEdge {
        /// The rejected edge length.
        edge_km: f64,
    },

    /// Bounding box was empty, inverted, or not finite.
    #[error("Invalid bounding box: {message}")]
    InvalidBoundingBox {
        /// Description of what is wrong with the box.
        message: String,
    },

    /// The requested tiling would exceed [`MAX_CELLS`].
    #[error("Grid would have about {estimated} cells (limit {max}); use a larger cell size")]
    TooManyCells {
        /// Upper estimate of the cell count.
        estimated: u64,
        /// The configured limit.
        max: usize,
    },
}
