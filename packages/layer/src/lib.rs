#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layer normalization and loading.
//!
//! Turns heterogeneous upstream inputs (`ArcGIS` GeoJSON pages, loose JSON
//! rows, the hourly air-quality CSV) into uniform [`FeatureCollection`]s
//! with canonical attribute names, and bundles them into a [`LayerSet`]
//! that the scoring engine queries. Remote sources are described by
//! embedded TOML definitions (see [`registry`]) and downloaded with a
//! paginated `ArcGIS` fetcher (see [`arcgis`]).

pub mod arcgis;
pub mod density;
pub mod fetch;
pub mod fields;
pub mod layer_set;
pub mod points;
pub mod progress;
pub mod registry;
pub mod retry;
pub mod source_def;
pub mod stations;

pub use density::{
    DensityRow, DensityStats, annotate_density, population_density, top_density_areas,
    write_density_csv,
};
pub use fetch::{FetchedLayer, fetch_all, fetch_source, load_registered_layers};
pub use fields::FieldResolver;
pub use layer_set::{LayerInputs, LayerSet};
pub use points::rows_to_points;
pub use progress::{LogProgress, NullProgress, ProgressCallback, null_progress};
pub use sitescore_geometry::{Feature, FeatureCollection};
pub use sitescore_layer_models::{LayerKind, StationReading, StationRecord};

use sitescore_geometry::GeometryError;

/// Errors that can occur while loading or normalizing layers.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source definition could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `GeoJSON` input was invalid.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A required layer was not supplied.
    #[error("Missing required layer: {kind}")]
    MissingLayer {
        /// The layer that was missing.
        kind: LayerKind,
    },

    /// Upstream data had an unusable shape or status.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}
