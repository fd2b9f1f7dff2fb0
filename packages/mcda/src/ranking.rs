//! Top-k selection over scored cells.

use sitescore_mcda_models::{Candidate, ScoredCell};

/// The `k` best allowed cells, best first, ranked from 1.
///
/// Vetoed cells are never candidates. Ties keep grid order.
#[must_use]
pub fn top_candidates(cells: &[ScoredCell], k: usize) -> Vec<Candidate> {
    let mut allowed: Vec<&ScoredCell> = cells.iter().filter(|c| c.allowed).collect();
    allowed.sort_by(|a, b| b.score.total_cmp(&a.score));

    allowed
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, cell)| Candidate {
            rank: i + 1,
            center: cell.center,
            score: cell.score,
            components: cell.components,
            raw: cell.raw.clone(),
        })
        .collect()
}
