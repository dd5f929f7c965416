//! Progress reporting trait for dataset loading.
//!
//! Defines a [`ProgressCallback`] trait that decouples progress reporting
//! from any specific rendering backend (e.g., `indicatif` progress bars or
//! silence). The CLI supplies an `indicatif` implementation; tests and
//! embedders that do not care use [`NullProgress`].

/// Trait for reporting progress from long-running loads.
///
/// Implementations must be `Send + Sync` so a single reporter can be shared
/// through an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of units, once known.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

