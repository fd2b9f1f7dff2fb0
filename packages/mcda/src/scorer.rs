//! A reusable scoring front end.
//!
//! [`Scorer`] owns the loaded layers and the last snapshot, and enforces
//! the two gates a dashboard needs: no run before the layers are ready,
//! and at most one run at a time.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use sitescore_layer::{LayerSet, ProgressCallback, null_progress};
use sitescore_mcda_models::{ScoringParameters, Snapshot};

use crate::engine::{ScoringRun, score};
use crate::export::write_csv;
use crate::{ExportError, ScoringError};

/// Clears the busy flag when a run ends, however it ends.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ScoringError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScoringError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs scoring against a shared [`LayerSet`] and keeps the last snapshot.
pub struct Scorer {
    layers: RwLock<Option<Arc<LayerSet>>>,
    busy: AtomicBool,
    last_snapshot: Mutex<Option<Snapshot>>,
    progress: Arc<dyn ProgressCallback>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(null_progress())
    }
}

impl Scorer {
    /// A scorer with no layers yet; runs fail with
    /// [`ScoringError::NotReady`] until [`Scorer::set_layers`] is called.
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressCallback>) -> Self {
        Self {
            layers: RwLock::new(None),
            busy: AtomicBool::new(false),
            last_snapshot: Mutex::new(None),
            progress,
        }
    }

    /// A scorer over already-loaded layers.
    #[must_use]
    pub fn with_layers(layers: LayerSet, progress: Arc<dyn ProgressCallback>) -> Self {
        let scorer = Self::new(progress);
        scorer.set_layers(Arc::new(layers));
        scorer
    }

    /// Installs (or replaces) the layers runs score against.
    pub fn set_layers(&self, layers: Arc<LayerSet>) {
        log::debug!("Scorer layers installed (ready={})", layers.is_ready());
        *self.layers.write().unwrap_or_else(PoisonError::into_inner) = Some(layers);
    }

    /// Whether a run would pass the readiness gate.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|l| l.is_ready())
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Scores with `params` and records the run's snapshot.
    ///
    /// # Errors
    ///
    /// * [`ScoringError::Busy`] if another run is in progress
    /// * [`ScoringError::NotReady`] if no ready layers are installed
    /// * any error from [`score`]
    pub fn run(&self, params: &ScoringParameters) -> Result<ScoringRun, ScoringError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let layers = self
            .layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ScoringError::NotReady)?;

        let run = score(&layers, params, self.progress.as_ref())?;
        let snapshot = run.snapshot();
        log::info!(
            "Run complete: {} candidates, best {:.3}",
            snapshot.candidates.len(),
            snapshot.candidates.first().map_or(0.0, |c| c.score)
        );
        *self
            .last_snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);

        Ok(run)
    }

    /// Snapshot of the last successful run.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.last_snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes the last snapshot as CSV.
    ///
    /// # Errors
    ///
    /// * [`ExportError::NoResults`] if there is no snapshot or it has no
    ///   candidates
    /// * any error from [`write_csv`]
    pub fn export_last<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let snapshot = self.last_snapshot().ok_or(ExportError::NoResults)?;
        write_csv(&snapshot, writer)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, polygon};
    use sitescore_layer::{Feature, LayerInputs, LayerKind};

    use super::*;
    use crate::export::read_csv;

    fn ready_layers() -> LayerSet {
        let mut inputs = LayerInputs::default();
        inputs.set(
            LayerKind::LandUse,
            [Feature::new(Geometry::Polygon(polygon![
                (x: -113.32, y: 53.52),
                (x: -113.30, y: 53.52),
                (x: -113.30, y: 53.53),
                (x: -113.32, y: 53.53),
                (x: -113.32, y: 53.52),
            ]))
            .with_property("lub_description", "CMU - Commercial Mixed Use")]
            .into_iter()
            .collect(),
        );
        inputs.set(
            LayerKind::Wifi,
            [Feature::point(-113.31, 53.525)].into_iter().collect(),
        );
        let mut layers = LayerSet::build(inputs);
        layers.mark_ready();
        layers
    }

    fn small_cells() -> ScoringParameters {
        ScoringParameters {
            cell_size_km: 0.2,
            ..ScoringParameters::default()
        }
    }

    #[test]
    fn not_ready_without_layers() {
        let scorer = Scorer::default();
        assert!(!scorer.is_ready());
        assert!(matches!(
            scorer.run(&small_cells()),
            Err(ScoringError::NotReady)
        ));
        assert!(!scorer.is_busy());
    }

    #[test]
    fn not_ready_until_marked() {
        let mut inputs = LayerInputs::default();
        inputs.land_use = Some(ready_layers().layer(LayerKind::LandUse).unwrap().clone());
        let scorer = Scorer::with_layers(LayerSet::build(inputs), null_progress());
        assert!(matches!(
            scorer.run(&small_cells()),
            Err(ScoringError::NotReady)
        ));
    }

    #[test]
    fn second_submission_while_busy_is_rejected() {
        let scorer = Scorer::with_layers(ready_layers(), null_progress());
        let guard = BusyGuard::acquire(&scorer.busy).unwrap();
        assert!(scorer.is_busy());
        assert!(matches!(scorer.run(&small_cells()), Err(ScoringError::Busy)));

        drop(guard);
        assert!(!scorer.is_busy());
        assert!(scorer.run(&small_cells()).is_ok());
    }

    #[test]
    fn busy_flag_clears_after_failed_run() {
        let scorer = Scorer::with_layers(ready_layers(), null_progress());
        let bad = ScoringParameters {
            max_distance_km: 0.0,
            ..ScoringParameters::default()
        };
        assert!(matches!(
            scorer.run(&bad),
            Err(ScoringError::InvalidParameters(_))
        ));
        assert!(!scorer.is_busy());
        assert!(scorer.last_snapshot().is_none());
    }

    #[test]
    fn run_records_snapshot_for_export() {
        let scorer = Scorer::with_layers(ready_layers(), null_progress());
        assert!(matches!(
            scorer.export_last(Vec::new()),
            Err(ExportError::NoResults)
        ));

        let run = scorer.run(&small_cells()).unwrap();
        assert!(!run.cells.is_empty());

        let snapshot = scorer.last_snapshot().unwrap();
        assert!(!snapshot.candidates.is_empty());
        assert!(snapshot.candidates.len() <= 10);
        assert_eq!(snapshot.candidates[0].rank, 1);

        let mut buffer = Vec::new();
        scorer.export_last(&mut buffer).unwrap();
        let rows = read_csv(buffer.as_slice()).unwrap();
        assert_eq!(rows.len(), snapshot.candidates.len());
        assert_eq!(rows[0].land_use_label, snapshot.candidates[0].raw.land_use_label);
    }
}
