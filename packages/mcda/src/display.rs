//! Score coloring and display rounding.
//!
//! Cosmetic only: nothing here feeds back into scores.

use serde::{Deserialize, Serialize};
use sitescore_mcda_models::ScoredCell;

/// Keeps the ramp finite when every cell has the same score.
const RANGE_EPSILON: f64 = 1e-9;

/// Lowest and highest final score of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    /// Lowest score.
    pub min: f64,
    /// Highest score.
    pub max: f64,
}

impl ScoreRange {
    /// Range over every cell's final score, vetoed cells included.
    ///
    /// `None` when there are no finite scores.
    #[must_use]
    pub fn from_cells(cells: &[ScoredCell]) -> Option<Self> {
        cells
            .iter()
            .map(|c| c.score)
            .filter(|s| s.is_finite())
            .fold(None, |range: Option<Self>, s| {
                Some(range.map_or(Self { min: s, max: s }, |r| Self {
                    min: r.min.min(s),
                    max: r.max.max(s),
                }))
            })
    }

    /// Position of `score` within the range, in `[0, 1]`.
    #[must_use]
    pub fn position(&self, score: f64) -> f64 {
        ((score - self.min) / (self.max - self.min + RANGE_EPSILON)).clamp(0.0, 1.0)
    }

    /// Fill color for `score`: pale blue at the bottom of the range, deep
    /// green at the top.
    #[must_use]
    pub fn color(&self, score: f64) -> String {
        let t = self.position(score);
        format!(
            "hsl({:.0}, {:.0}%, {:.0}%)",
            160.0f64.mul_add(-t, 200.0),
            40.0f64.mul_add(t, 30.0),
            45.0f64.mul_add(-t, 85.0),
        )
    }
}

/// Rounds to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
