//! # topo-event-dynamics
//!
//! Topology-Driven Event Reconciliation and Inference for skeletonized
//! biological network time series.
//!
//! ## Problem
//!
//! A skeletonized network (e.g. a mitochondrial or fungal network imaged
//! over time) evolves through discrete remodeling events: fusions,
//! fissions, extrusions, retractions. Two independent observations of the
//! same dynamics exist:
//!
//! 1. **Topology snapshots**: per-frame counts of tips (degree-1 nodes)
//!    and junctions (degree-3+ nodes), whose frame-to-frame deltas are
//!    exact but anonymous; they say how much changed, not why.
//! 2. **Spatially detected events**: a detector matches nodes between
//!    frames by position and classifies discrete events; informative but
//!    fallible (mis-segmentation, missed or spurious matches).
//!
//! ## Methodology
//!
//! A fixed linear forward model assigns each event type its exact effect
//! on the tip and junction counts. On top of it this crate:
//!
//! - **Reconciles**: compares the topology change the detected events
//!   imply against the change actually observed, per transition and in
//!   aggregate, reporting discrepancies and percent-explained.
//! - **Infers**: solves the inverse problem of recovering event counts
//!   from topology deltas alone. Six unknowns against two equations is
//!   underdetermined by construction, so the solver offers two objectives:
//!   the fewest total events (`minimize_total`) or the smallest exact
//!   correction to the detector's counts (`minimize_discrepancy`).
//! - **Compares**: diffs detected against inferred counts per event type
//!   to flag systematically under- or over-detected event classes.
//!
//! Every computation is a pure function over immutable inputs; transitions
//! are independent and processed in parallel, with per-transition failures
//! isolated into diagnostics rather than aborting the batch.

pub mod error;
pub mod events;
pub mod infer;
pub mod io;
pub mod reconcile;
pub mod topology;

pub use error::{Result, TopologyError};
pub use events::{apply, EventCountVector, EventType, TopologyDelta};
pub use infer::{
    infer_timeseries, infer_transition, solve_event_counts, InferenceBatch, InferenceMethod,
    InferenceResult,
};
pub use reconcile::{
    compare_timeseries, reconcile_timeseries, summarize, ComparisonReport, ReconciliationResult,
    SummaryRow,
};
pub use topology::{
    compute_transitions, extract_timeseries_metrics, FrameMetrics, NodeRow, Transition,
};
