//! Exact integer solver for the event-count inverse problem.
//!
//! ## Reduction
//!
//! The six event types form three opposite-effect pairs: tip-edge fusion /
//! junction breakage (∓1, ±1), tip-tip fusion / fission (∓2, 0), and
//! extrusion / retraction (±1, ±1). Writing the signed *net* counts
//!
//! ```text
//! a = n_breakage − n_tip_edge_fusion
//! b = n_fission  − n_tip_tip_fusion
//! c = n_extrusion − n_retraction
//! ```
//!
//! the two equality constraints collapse to
//!
//! ```text
//! a + 2b + c = Δtips        −a + c = Δjunctions
//! ```
//!
//! so c = Δjunctions + a and b = (Δtips − Δjunctions)/2 − a: a single free
//! integer parameter a, with integral b requiring Δtips + Δjunctions to be
//! even. Every event changes tips+junctions by 0 or ±2, so odd-parity
//! targets have no integer solution at all; that is the infeasible case.
//!
//! Any feasible vector decomposes uniquely into nets plus a shared
//! nonnegative slack on each pair (p, q, r), and the objectives separate
//! over the pairs. minimize_total drops the slacks (they only add events)
//! and minimizes |a| + |b| + |c|, a piecewise-linear function of a with its
//! unique minimum at the median breakpoint. minimize_discrepancy scans a
//! over a provably sufficient window, fitting each pair's slack by clamped
//! one-dimensional convex minimization.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Result, TopologyError};
use crate::events::{self, EventCountVector, TopologyDelta};
use crate::topology::Transition;

/// Objective used to select one member of the feasible solution set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceMethod {
    /// Fewest total events explaining the deltas exactly.
    MinimizeTotal,
    /// Feasible vector closest (squared distance) to a detected prior.
    MinimizeDiscrepancy,
}

impl InferenceMethod {
    pub const ALL: [InferenceMethod; 2] = [
        InferenceMethod::MinimizeTotal,
        InferenceMethod::MinimizeDiscrepancy,
    ];

    /// Snake-case label used in output file names and reports.
    pub fn label(self) -> &'static str {
        match self {
            InferenceMethod::MinimizeTotal => "minimize_total",
            InferenceMethod::MinimizeDiscrepancy => "minimize_discrepancy",
        }
    }
}

/// Inference outcome for one transition.
///
/// The residuals are part of the solver contract: any returned solution
/// satisfies the equality constraints exactly, so both are always zero for
/// a resolved transition.
#[derive(Debug, Clone, Copy)]
pub struct InferenceResult {
    pub transition: Transition,
    pub method: InferenceMethod,
    pub inferred: EventCountVector,
    pub residual_tips: i64,
    pub residual_junctions: i64,
}

/// A transition whose inference failed, kept for diagnostics output.
#[derive(Debug)]
pub struct UnresolvedTransition {
    pub transition: Transition,
    pub error: TopologyError,
}

/// Ordered batch outcome: resolved results plus a diagnostics list.
#[derive(Debug)]
pub struct InferenceBatch {
    pub method: InferenceMethod,
    pub resolved: Vec<InferenceResult>,
    pub unresolved: Vec<UnresolvedTransition>,
}

impl InferenceBatch {
    /// Inferred vector for a transition, when it resolved.
    pub fn vector_for(&self, transition: &Transition) -> Option<&EventCountVector> {
        self.resolved
            .iter()
            .find(|r| {
                r.transition.from_frame == transition.from_frame
                    && r.transition.to_frame == transition.to_frame
            })
            .map(|r| &r.inferred)
    }
}

/// Solve one target under the selected objective.
///
/// Returns `None` when no nonnegative integer vector satisfies the
/// equality constraints (odd tips+junctions parity). For
/// `MinimizeDiscrepancy` a missing prior means the zero vector, yielding
/// the minimal-norm feasible solution.
pub fn solve_event_counts(
    target: TopologyDelta,
    method: InferenceMethod,
    prior: Option<&EventCountVector>,
) -> Option<EventCountVector> {
    if (target.tips + target.junctions) % 2 != 0 {
        return None;
    }
    match method {
        InferenceMethod::MinimizeTotal => Some(minimize_total(target)),
        InferenceMethod::MinimizeDiscrepancy => {
            let zero = EventCountVector::zero();
            Some(minimize_discrepancy(target, prior.unwrap_or(&zero)))
        }
    }
}

/// Reconstruct the full count vector from net pair counts.
fn from_nets(a: i64, b: i64, c: i64) -> EventCountVector {
    EventCountVector::new([
        (-a).max(0) as u64,
        a.max(0) as u64,
        (-b).max(0) as u64,
        b.max(0) as u64,
        c.max(0) as u64,
        (-c).max(0) as u64,
    ])
}

fn median3(x: i64, y: i64, z: i64) -> i64 {
    x + y + z - x.max(y).max(z) - x.min(y).min(z)
}

/// Minimal-sum solution, exact and unique.
///
/// In a minimal solution no opposite pair has both members nonzero
/// (removing one of each keeps the target and lowers the sum), so the sum
/// is |a| + |b| + |c| = |a| + |a − s| + |a + Δjunctions| with
/// s = (Δtips − Δjunctions)/2, minimized at the median of its breakpoints.
/// Uniqueness makes the fixed preference order of the event table vacuous
/// here; it still governs output ordering.
fn minimize_total(target: TopologyDelta) -> EventCountVector {
    let s = (target.tips - target.junctions) / 2;
    let a = median3(0, s, -target.junctions);
    from_nets(a, s - a, target.junctions + a)
}

/// Best nonnegative integer slack for one opposite pair.
///
/// Minimizes (u+p−du)² + (v+p−dv)² over p ≥ 0. The real minimizer is
/// ((du−u)+(dv−v))/2; convexity means its two integer neighbors (clamped
/// at zero) suffice. Cost ties resolve to the smaller slack.
fn fit_pair(u: i64, v: i64, du: i64, dv: i64) -> (i64, i64, i128) {
    let cost = |p: i64| -> i128 {
        let e1 = (u + p - du) as i128;
        let e2 = (v + p - dv) as i128;
        e1 * e1 + e2 * e2
    };
    let base = ((du - u) + (dv - v)).div_euclid(2);
    let lo = base.max(0);
    let hi = (base + 1).max(0);
    let (c_lo, c_hi) = (cost(lo), cost(hi));
    let p = if c_hi < c_lo { hi } else { lo };
    (u + p, v + p, cost(p))
}

/// Candidate vector and squared distance to the prior for a given net a.
fn discrepancy_candidate(a: i64, target: TopologyDelta, d: &[i64; 6]) -> (EventCountVector, i128) {
    let s = (target.tips - target.junctions) / 2;
    let b = s - a;
    let c = target.junctions + a;
    let (n1, n2, c12) = fit_pair((-a).max(0), a.max(0), d[0], d[1]);
    let (n3, n4, c34) = fit_pair((-b).max(0), b.max(0), d[2], d[3]);
    let (n5, n6, c56) = fit_pair(c.max(0), (-c).max(0), d[4], d[5]);
    let vector = EventCountVector::new([
        n1 as u64, n2 as u64, n3 as u64, n4 as u64, n5 as u64, n6 as u64,
    ]);
    (vector, c12 + c34 + c56)
}

/// True when `challenger` beats `incumbent` at equal cost: the first
/// differing event type (preference order) carries the larger count.
fn preferred_on_tie(incumbent: &EventCountVector, challenger: &EventCountVector) -> bool {
    for (inc, ch) in incumbent.counts().iter().zip(challenger.counts()) {
        if ch != inc {
            return ch > inc;
        }
    }
    false
}

/// Closest feasible vector to the detected prior, exact over integers.
///
/// The squared distance as a function of the net a is bounded below by
/// (a − d_breakage)² for large positive a and (−a − d_tip_edge_fusion)²
/// for large negative a, so with an incumbent cost U every optimum lies in
/// [−d₁ − √U, d₂ + √U]; that window is scanned exhaustively.
fn minimize_discrepancy(target: TopologyDelta, prior: &EventCountVector) -> EventCountVector {
    let d: [i64; 6] = {
        let counts = prior.counts();
        [
            counts[0] as i64,
            counts[1] as i64,
            counts[2] as i64,
            counts[3] as i64,
            counts[4] as i64,
            counts[5] as i64,
        ]
    };

    let s = (target.tips - target.junctions) / 2;
    let seed_total = median3(0, s, -target.junctions);
    let seed_prior = d[1] - d[0];
    let (mut best, mut best_cost) = discrepancy_candidate(seed_total, target, &d);
    let incumbent = discrepancy_candidate(seed_prior, target, &d);
    if incumbent.1 < best_cost {
        (best, best_cost) = incumbent;
    }

    let radius = (best_cost as f64).sqrt().ceil() as i64 + 1;
    let (lo, hi) = (-d[0] - radius, d[1] + radius);
    for a in lo..=hi {
        let (candidate, cost) = discrepancy_candidate(a, target, &d);
        if cost < best_cost || (cost == best_cost && preferred_on_tie(&best, &candidate)) {
            best = candidate;
            best_cost = cost;
        }
    }
    best
}

/// Infer event counts for one transition.
///
/// Post-condition: `apply(inferred) == transition.delta()` exactly; the
/// recorded residuals are zero for every resolved transition.
pub fn infer_transition(
    transition: &Transition,
    method: InferenceMethod,
    prior: Option<&EventCountVector>,
) -> Result<InferenceResult> {
    let target = transition.delta();
    let inferred = solve_event_counts(target, method, prior).ok_or_else(|| {
        TopologyError::InfeasibleTransition {
            from_frame: transition.from_frame,
            to_frame: transition.to_frame,
            delta_tips: target.tips,
            delta_junctions: target.junctions,
        }
    })?;

    let residual = events::apply(&inferred) - target;
    debug_assert!(residual.is_zero(), "solver violated the residual invariant");
    debug!(
        transition = %transition.label(),
        method = method.label(),
        total_events = inferred.total(),
        "transition resolved"
    );

    Ok(InferenceResult {
        transition: *transition,
        method,
        inferred,
        residual_tips: residual.tips,
        residual_junctions: residual.junctions,
    })
}

/// Infer every transition of the series under one objective.
///
/// Transitions are independent, so the batch fans out across worker
/// threads and joins into frame order. Infeasible transitions land in the
/// diagnostics list and never abort the rest of the batch. `priors` aligns
/// with `transitions` by position; absent entries mean a zero prior.
pub fn infer_timeseries(
    transitions: &[Transition],
    method: InferenceMethod,
    priors: Option<&[EventCountVector]>,
) -> InferenceBatch {
    let outcomes: Vec<Result<InferenceResult>> = transitions
        .par_iter()
        .enumerate()
        .map(|(i, transition)| {
            let prior = priors.and_then(|p| p.get(i));
            infer_transition(transition, method, prior)
        })
        .collect();

    let mut resolved = Vec::with_capacity(transitions.len());
    let mut unresolved = Vec::new();
    for (transition, outcome) in transitions.iter().zip(outcomes) {
        match outcome {
            Ok(result) => resolved.push(result),
            Err(error) => {
                warn!(transition = %transition.label(), %error, "transition left unresolved");
                unresolved.push(UnresolvedTransition {
                    transition: *transition,
                    error,
                });
            }
        }
    }

    InferenceBatch {
        method,
        resolved,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::apply;

    fn delta(tips: i64, junctions: i64) -> TopologyDelta {
        TopologyDelta::new(tips, junctions)
    }

    fn transition(tips: i64, junctions: i64) -> Transition {
        Transition {
            from_frame: 1,
            to_frame: 2,
            delta_tips: tips,
            delta_junctions: junctions,
            delta_components: None,
        }
    }

    #[test]
    fn test_minimize_total_single_tip_edge_fusion() {
        // Tips 5->4, junctions 3->4.
        let v = solve_event_counts(delta(-1, 1), InferenceMethod::MinimizeTotal, None).unwrap();
        assert_eq!(v.counts(), &[1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_minimize_total_fusion_plus_extrusion() {
        let v = solve_event_counts(delta(0, 2), InferenceMethod::MinimizeTotal, None).unwrap();
        assert_eq!(v.counts(), &[1, 0, 0, 0, 1, 0]);
        assert_eq!(apply(&v), delta(0, 2));
        assert_eq!(v.total(), 2);
    }

    #[test]
    fn test_minimize_total_pure_events() {
        let cases = [
            (delta(1, 1), [0, 0, 0, 0, 1, 0]),
            (delta(-1, -1), [0, 0, 0, 0, 0, 1]),
            (delta(2, 0), [0, 0, 0, 1, 0, 0]),
            (delta(-2, 0), [0, 0, 1, 0, 0, 0]),
            (delta(1, -1), [0, 1, 0, 0, 0, 0]),
        ];
        for (target, expected) in cases {
            let v = solve_event_counts(target, InferenceMethod::MinimizeTotal, None).unwrap();
            assert_eq!(v.counts(), &expected, "target {target:?}");
        }
    }

    #[test]
    fn test_odd_parity_is_infeasible() {
        for (tips, junctions) in [(1, 0), (0, 1), (-3, 0), (2, 1)] {
            assert!(
                solve_event_counts(delta(tips, junctions), InferenceMethod::MinimizeTotal, None)
                    .is_none(),
                "({tips},{junctions}) should be infeasible"
            );
        }
    }

    #[test]
    fn test_residual_invariant_over_grid() {
        let prior = EventCountVector::new([2, 0, 1, 0, 0, 3]);
        for tips in -6..=6 {
            for junctions in -6..=6 {
                if (tips + junctions) % 2 != 0 {
                    continue;
                }
                for method in InferenceMethod::ALL {
                    let v = solve_event_counts(delta(tips, junctions), method, Some(&prior))
                        .unwrap_or_else(|| panic!("({tips},{junctions}) must be feasible"));
                    assert_eq!(apply(&v), delta(tips, junctions), "{method:?}");
                }
            }
        }
    }

    #[test]
    fn test_discrepancy_returns_consistent_prior_unchanged() {
        // apply(prior) = (3, 1): already topology-consistent.
        let prior = EventCountVector::new([0, 2, 1, 0, 3, 0]);
        assert_eq!(apply(&prior), delta(3, 1));
        let v =
            solve_event_counts(delta(3, 1), InferenceMethod::MinimizeDiscrepancy, Some(&prior))
                .unwrap();
        assert_eq!(v, prior);
    }

    #[test]
    fn test_discrepancy_without_prior_is_minimal_norm() {
        let v =
            solve_event_counts(delta(-1, 1), InferenceMethod::MinimizeDiscrepancy, None).unwrap();
        assert_eq!(v.counts(), &[1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_discrepancy_applies_smallest_correction() {
        // Prior explains (1, 1) but the observed change is (3, 1):
        // one added fission is the cheapest exact correction.
        let prior = EventCountVector::new([0, 0, 0, 0, 1, 0]);
        let v =
            solve_event_counts(delta(3, 1), InferenceMethod::MinimizeDiscrepancy, Some(&prior))
                .unwrap();
        assert_eq!(v.counts(), &[0, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_discrepancy_is_deterministic_on_cost_ties() {
        // Prior (1,0,...) against a zero target: keeping the fusion and
        // adding a breakage costs the same as dropping the fusion. The
        // fitted slack keeps the correction at the zero vector; repeated
        // calls must agree.
        let prior = EventCountVector::new([1, 0, 0, 0, 0, 0]);
        let first =
            solve_event_counts(delta(0, 0), InferenceMethod::MinimizeDiscrepancy, Some(&prior))
                .unwrap();
        for _ in 0..10 {
            let again = solve_event_counts(
                delta(0, 0),
                InferenceMethod::MinimizeDiscrepancy,
                Some(&prior),
            )
            .unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(apply(&first), delta(0, 0));
    }

    #[test]
    fn test_infer_transition_records_zero_residuals() {
        let result =
            infer_transition(&transition(-1, 1), InferenceMethod::MinimizeTotal, None).unwrap();
        assert_eq!(result.residual_tips, 0);
        assert_eq!(result.residual_junctions, 0);
        assert_eq!(result.inferred.counts(), &[1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_batch_isolates_infeasible_transitions() {
        let transitions = vec![transition(-1, 1), transition(1, 0), transition(0, 2)];
        let batch = infer_timeseries(&transitions, InferenceMethod::MinimizeTotal, None);
        assert_eq!(batch.resolved.len(), 2);
        assert_eq!(batch.unresolved.len(), 1);
        assert!(matches!(
            batch.unresolved[0].error,
            TopologyError::InfeasibleTransition {
                delta_tips: 1,
                delta_junctions: 0,
                ..
            }
        ));
        // Resolved results keep frame order.
        assert_eq!(batch.resolved[0].transition.delta_tips, -1);
        assert_eq!(batch.resolved[1].transition.delta_tips, 0);
    }
}
