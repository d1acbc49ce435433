//! Optional metric counters.
//!
//! When the `metrics` feature is enabled the engines emit:
//!
//! - `label_propagation_passes` (counter)
//! - `label_propagation_label_changes` (counter)
//! - `hierarchy_merges` (counter)
//! - `hierarchy_forest_fallbacks` (counter)
//!
//! Without the feature every recorder compiles to a no-op.

#[cfg(feature = "metrics")]
pub(crate) fn record_pass(changes: usize) {
    metrics::counter!("label_propagation_passes").increment(1);
    metrics::counter!("label_propagation_label_changes").increment(changes as u64);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_pass(_changes: usize) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_merge() {
    metrics::counter!("hierarchy_merges").increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_merge() {}

#[cfg(feature = "metrics")]
pub(crate) fn record_forest_fallback() {
    metrics::counter!("hierarchy_forest_fallbacks").increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_forest_fallback() {}
