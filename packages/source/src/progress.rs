//! Progress reporting for the region batch.
//!
//! [`SyncProgress`] keeps the batch loop independent of how progress is
//! shown. The CLI renders it with an `indicatif` bar; tests and library
//! callers use [`NullProgress`].

use std::sync::Arc;

/// Receives batch progress events.
pub trait SyncProgress: Send + Sync {
    /// Called once before the first region with the number of regions.
    fn start(&self, regions: u64);

    /// Called when work on a region begins.
    fn region_started(&self, region: &str);

    /// Called when a region finishes, successfully or not.
    fn region_finished(&self, region: &str, succeeded: bool);

    /// Called once after the last region with a one-line summary.
    fn finish(&self, summary: &str);
}

/// Discards every event.
pub struct NullProgress;

impl SyncProgress for NullProgress {
    fn start(&self, _regions: u64) {}
    fn region_started(&self, _region: &str) {}
    fn region_finished(&self, _region: &str, _succeeded: bool) {}
    fn finish(&self, _summary: &str) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn SyncProgress> {
    Arc::new(NullProgress)
}
