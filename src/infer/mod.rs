//! Topology-Driven Event Inference
//!
//! The inverse problem: recover per-transition event counts from the
//! observed (Δtips, Δjunctions) alone. With six event types and only two
//! constraint equations the system is underdetermined by construction (a
//! unique solution does not exist in general), so the solver picks one
//! defensible member of the feasible set under an explicit objective:
//!
//! - `minimize_total`: the fewest events that explain the change exactly.
//! - `minimize_discrepancy`: the smallest squared correction to a detected
//!   prior that makes it topology-consistent.
//!
//! Both objectives treat the forward-model equalities as hard constraints:
//! every returned vector reproduces the target deltas exactly. Transitions
//! with no nonnegative integer solution are reported infeasible and skipped
//! without aborting the batch.

mod solver;

pub use solver::{
    infer_timeseries, infer_transition, solve_event_counts, InferenceBatch, InferenceMethod,
    InferenceResult, UnresolvedTransition,
};
