//! Topology Metrics over a Network Time Series
//!
//! A skeletonized network frame is summarized by three counts:
//!
//! - **tips**: nodes of degree 1 (free ends)
//! - **junctions**: nodes of degree ≥ 3 (branch points)
//! - **components**: connected subgraphs (only when adjacency is available)
//!
//! Consecutive frames pair into transitions carrying the signed deltas of
//! these counts. The deltas are what the reconciliation and inference
//! layers consume; the raw per-node degree tables never travel further
//! than this module.

mod metrics;
mod transitions;

pub use metrics::{extract_frame_metrics, extract_timeseries_metrics, FrameMetrics, NodeRow};
pub use transitions::{compute_transitions, Transition};
