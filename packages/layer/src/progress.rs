//! Progress reporting for layer loading and scoring passes.
//!
//! Callers hand an `Arc<dyn ProgressCallback>` to long-running operations
//! (fetching every registered source, measuring every hex cell) and choose
//! how it renders. [`LogProgress`] reports through the `log` facade;
//! [`NullProgress`] discards everything.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress updates from a long-running operation.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total expected units of work.
    fn set_total(&self, total: u64);

    /// Sets the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Updates the message describing the current step.
    fn set_message(&self, msg: String);

    /// Marks the operation complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Logs each step at `info` and the position at `debug`.
pub struct LogProgress {
    label: String,
    total: AtomicU64,
    position: AtomicU64,
}

impl LogProgress {
    /// Creates a reporter whose log lines are prefixed with `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            total: AtomicU64::new(0),
            position: AtomicU64::new(0),
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Expected total, zero if never set.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for LogProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn set_position(&self, pos: u64) {
        self.position.store(pos, Ordering::Relaxed);
    }

    fn inc(&self, delta: u64) {
        let pos = self.position.fetch_add(delta, Ordering::Relaxed) + delta;
        log::debug!("{}: {pos}/{}", self.label, self.total());
    }

    fn set_message(&self, msg: String) {
        log::info!("{}: {msg}", self.label);
    }

    fn finish(&self, msg: String) {
        log::info!("{}: {msg} ({}/{})", self.label, self.position(), self.total());
    }
}
