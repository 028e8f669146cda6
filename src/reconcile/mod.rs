//! Reconciliation of Detected Events against Observed Topology
//!
//! The forward model turns a detected event set into the topology change
//! it would imply; reconciliation compares that expectation against the
//! change actually observed. A perfect detector leaves zero discrepancy.
//! Residual discrepancy flags mis-segmentation, missed events, or spurious
//! detections, quantified per transition and in aggregate as the percent
//! of observed change the detections explain.
//!
//! The comparison reporter applies the same idea to the solver's output:
//! per-type signed differences between detected and inferred counts, where
//! large positive differences mark under-detected event types and large
//! negative ones over-detection.

mod comparison;
mod reconciler;

pub use comparison::{
    compare_timeseries, compare_transition, ComparisonReport, ComparisonRow, TransitionComparison,
};
pub use reconciler::{
    percent_explained, reconcile_timeseries, reconcile_transition, summarize,
    ReconciliationResult, SummaryMetric, SummaryRow,
};
