#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-criteria suitability scoring.
//!
//! A run tiles the land-use extent with hexagons, measures seven criteria
//! at every cell center against a loaded [`LayerSet`], normalizes and
//! weights them, vetoes cells inside exclusion zones, and ranks the rest.
//! Scoring is two-phase: [`engine::measure`] takes raw measurements for
//! every cell, then [`engine::compose`] normalizes them against cross-cell
//! maxima and the census density range.
//!
//! [`Scorer`] wraps a run with the readiness and busy checks a dashboard
//! needs, and keeps the last [`Snapshot`] for [`export`].

pub mod config;
pub mod display;
pub mod engine;
pub mod export;
pub mod ranking;
pub mod scorer;
pub mod snapshot;

pub use engine::{CellMeasurement, DensityRange, ScoringRun, compose, measure, score};
pub use export::{ExportRow, read_csv, write_csv};
pub use ranking::top_candidates;
pub use scorer::Scorer;
pub use sitescore_layer::LayerSet;
pub use sitescore_mcda_models::{
    Candidate, ComponentScores, Mode, NormalizedWeights, Preference, RawMeasurements,
    ScoredCell, ScoringParameters, Snapshot, Weights, ZeroWeightPolicy,
};
pub use snapshot::build_snapshot;

use sitescore_hexgrid::HexGridError;
use sitescore_mcda_models::InvalidParameter;

/// Errors that can stop a scoring run from starting.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Layers are still loading or the land-use layer is missing.
    #[error("Not ready: layers are still loading")]
    NotReady,

    /// Another run is in progress.
    #[error("A scoring run is already in progress")]
    Busy,

    /// Parameters failed validation.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] InvalidParameter),

    /// The analysis grid could not be built.
    #[error("Grid error: {0}")]
    Grid(#[from] HexGridError),

    /// A TOML parameter file could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON parameter file could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while exporting or re-reading candidates.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// There is no snapshot, or it has no candidates.
    #[error("No top candidates available yet. Run scoring first.")]
    NoResults,

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the metadata header failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
