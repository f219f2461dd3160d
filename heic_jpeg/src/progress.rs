//! Progress notifications from the collecting loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Snapshot sent after each task's outcome has been collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub done: usize,
    pub total: usize,
    pub current_file: String,
    pub succeeded: bool,
    /// `floor(100 * done / total)`
    pub percent: u8,
}

impl ProgressUpdate {
    pub fn new(done: usize, total: usize, current_file: String, succeeded: bool) -> Self {
        Self {
            done,
            total,
            current_file,
            succeeded,
            percent: percent_complete(done, total),
        }
    }
}

pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.min(total) * 100 / total) as u8
}

/// Called synchronously on the thread that runs the batch.
pub trait ProgressObserver {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate),
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Observer used when the caller does not care about progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Cooperative cancellation flag. Workers finish their current file; tasks not
/// yet started are reported as cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
