//! Forward model: fixed linear map from event counts to topology deltas.

use ndarray::{arr1, arr2, Array1, Array2};

/// Number of modeled event types.
pub const EVENT_TYPE_COUNT: usize = 6;

/// The six remodeling event types, in canonical preference order.
///
/// The order is load-bearing: it fixes the column order of the coefficient
/// table, the layout of [`EventCountVector`], the tie-breaking preference of
/// the inference solver, and the row order of every output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    TipEdgeFusion,
    JunctionBreakage,
    TipTipFusion,
    TipTipFission,
    Extrusion,
    Retraction,
}

impl EventType {
    pub const ALL: [EventType; EVENT_TYPE_COUNT] = [
        EventType::TipEdgeFusion,
        EventType::JunctionBreakage,
        EventType::TipTipFusion,
        EventType::TipTipFission,
        EventType::Extrusion,
        EventType::Retraction,
    ];

    /// Snake-case label used in table columns and file names.
    pub fn label(self) -> &'static str {
        match self {
            EventType::TipEdgeFusion => "tip_edge_fusion",
            EventType::JunctionBreakage => "junction_breakage",
            EventType::TipTipFusion => "tip_tip_fusion",
            EventType::TipTipFission => "tip_tip_fission",
            EventType::Extrusion => "extrusion",
            EventType::Retraction => "retraction",
        }
    }

    /// Column index in the coefficient table and count vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Effect of one event of this type on the tip count.
    pub fn tip_effect(self) -> i64 {
        TOPOLOGY_EFFECTS[0][self.index()]
    }

    /// Effect of one event of this type on the junction count.
    pub fn junction_effect(self) -> i64 {
        TOPOLOGY_EFFECTS[1][self.index()]
    }
}

/// Fixed topology-effect coefficients.
///
/// Row 0: tip effects, row 1: junction effects; columns follow
/// [`EventType::ALL`]. Shared read-only by every transition worker.
pub const TOPOLOGY_EFFECTS: [[i64; EVENT_TYPE_COUNT]; 2] = [
    [-1, 1, -2, 2, 1, -1], // tips equation
    [1, -1, 0, 0, 1, -1],  // junctions equation
];

/// The coefficient table as a 2×6 matrix.
pub fn effect_matrix() -> Array2<i64> {
    arr2(&TOPOLOGY_EFFECTS)
}

/// A signed change in tip and junction counts across one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopologyDelta {
    pub tips: i64,
    pub junctions: i64,
}

impl TopologyDelta {
    pub fn new(tips: i64, junctions: i64) -> Self {
        Self { tips, junctions }
    }

    pub fn is_zero(self) -> bool {
        self.tips == 0 && self.junctions == 0
    }
}

impl std::ops::Sub for TopologyDelta {
    type Output = TopologyDelta;

    fn sub(self, rhs: TopologyDelta) -> TopologyDelta {
        TopologyDelta::new(self.tips - rhs.tips, self.junctions - rhs.junctions)
    }
}

/// Immutable vector of nonnegative event counts, indexed by [`EventType`].
///
/// Two instances exist per transition: the externally detected counts and
/// the solver-inferred counts. Instances are value snapshots; derived
/// quantities always construct a fresh vector rather than mutating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCountVector {
    counts: [u64; EVENT_TYPE_COUNT],
}

impl EventCountVector {
    pub fn new(counts: [u64; EVENT_TYPE_COUNT]) -> Self {
        Self { counts }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, event: EventType) -> u64 {
        self.counts[event.index()]
    }

    pub fn counts(&self) -> &[u64; EVENT_TYPE_COUNT] {
        &self.counts
    }

    /// Total number of events across all types.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventType, u64)> + '_ {
        EventType::ALL.iter().map(|&e| (e, self.counts[e.index()]))
    }
}

/// Apply the forward model: the topology change implied by `counts`.
///
/// Pure and total; the dot product of the count vector with each
/// coefficient row.
pub fn apply(counts: &EventCountVector) -> TopologyDelta {
    let n: Array1<i64> = arr1(counts.counts()).mapv(|c| c as i64);
    let delta = effect_matrix().dot(&n);
    TopologyDelta::new(delta[0], delta[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_table() {
        // The table is authoritative; lock every entry.
        assert_eq!(EventType::TipEdgeFusion.tip_effect(), -1);
        assert_eq!(EventType::TipEdgeFusion.junction_effect(), 1);
        assert_eq!(EventType::JunctionBreakage.tip_effect(), 1);
        assert_eq!(EventType::JunctionBreakage.junction_effect(), -1);
        assert_eq!(EventType::TipTipFusion.tip_effect(), -2);
        assert_eq!(EventType::TipTipFusion.junction_effect(), 0);
        assert_eq!(EventType::TipTipFission.tip_effect(), 2);
        assert_eq!(EventType::TipTipFission.junction_effect(), 0);
        assert_eq!(EventType::Extrusion.tip_effect(), 1);
        assert_eq!(EventType::Extrusion.junction_effect(), 1);
        assert_eq!(EventType::Retraction.tip_effect(), -1);
        assert_eq!(EventType::Retraction.junction_effect(), -1);
    }

    #[test]
    fn test_apply_zero() {
        assert_eq!(apply(&EventCountVector::zero()), TopologyDelta::new(0, 0));
    }

    #[test]
    fn test_apply_mixed_counts() {
        // 2 tip-edge fusions, 1 fission, 3 extrusions, 1 retraction:
        // tips: 2*(-1) + 1*2 + 3*1 + 1*(-1) = 2
        // junctions: 2*1 + 0 + 3*1 + 1*(-1) = 4
        let v = EventCountVector::new([2, 0, 0, 1, 3, 1]);
        assert_eq!(apply(&v), TopologyDelta::new(2, 4));
    }

    #[test]
    fn test_apply_matches_per_type_effects() {
        let v = EventCountVector::new([1, 2, 3, 4, 5, 6]);
        let expected_tips: i64 = v
            .iter()
            .map(|(e, c)| e.tip_effect() * c as i64)
            .sum();
        let expected_junctions: i64 = v
            .iter()
            .map(|(e, c)| e.junction_effect() * c as i64)
            .sum();
        assert_eq!(apply(&v), TopologyDelta::new(expected_tips, expected_junctions));
    }
}
