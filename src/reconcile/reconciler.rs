//! Per-transition and aggregate reconciliation metrics.

use crate::events::{self, EventCountVector, TopologyDelta};
use crate::topology::Transition;

/// Reconciliation of one transition: observed change vs. the change the
/// detected events imply. Derived and read-only; inputs are never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationResult {
    pub transition: Transition,
    pub actual: TopologyDelta,
    pub expected: TopologyDelta,
    /// Raw signed discrepancy `actual − expected`, kept for diagnostics.
    pub discrepancy: TopologyDelta,
    pub percent_explained_tips: f64,
    pub percent_explained_junctions: f64,
}

/// Share of the observed change explained by the detections, in [0, 100].
///
/// `100 · (1 − |discrepancy| / max(1, |actual|))`, clamped so that a
/// discrepancy larger than the observed change reads as 0% rather than a
/// negative percentage. 100 iff the discrepancy is zero.
pub fn percent_explained(actual: i64, discrepancy: i64) -> f64 {
    let ratio = discrepancy.unsigned_abs() as f64 / actual.unsigned_abs().max(1) as f64;
    (100.0 * (1.0 - ratio)).clamp(0.0, 100.0)
}

/// Reconcile one transition against its detected event counts.
pub fn reconcile_transition(
    transition: &Transition,
    detected: &EventCountVector,
) -> ReconciliationResult {
    let actual = transition.delta();
    let expected = events::apply(detected);
    let discrepancy = actual - expected;
    ReconciliationResult {
        transition: *transition,
        actual,
        expected,
        discrepancy,
        percent_explained_tips: percent_explained(actual.tips, discrepancy.tips),
        percent_explained_junctions: percent_explained(actual.junctions, discrepancy.junctions),
    }
}

/// Reconcile every transition; `detected` aligns by position.
pub fn reconcile_timeseries(
    transitions: &[Transition],
    detected: &[EventCountVector],
) -> Vec<ReconciliationResult> {
    debug_assert_eq!(transitions.len(), detected.len());
    transitions
        .iter()
        .zip(detected)
        .map(|(transition, counts)| reconcile_transition(transition, counts))
        .collect()
}

/// The two reconciled metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMetric {
    Tips,
    Junctions,
}

impl SummaryMetric {
    pub fn label(self) -> &'static str {
        match self {
            SummaryMetric::Tips => "tips",
            SummaryMetric::Junctions => "junctions",
        }
    }
}

/// One row of the aggregate reconciliation summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRow {
    pub metric: SummaryMetric,
    pub actual_total: i64,
    pub expected_total: i64,
    pub discrepancy: i64,
    pub percent_explained: f64,
}

impl SummaryRow {
    /// One-line reading of the aggregate discrepancy sign.
    pub fn interpretation(&self) -> &'static str {
        match self.discrepancy.cmp(&0) {
            std::cmp::Ordering::Equal => "detected events fully explain the observed change",
            std::cmp::Ordering::Greater => {
                "observed change exceeds detected events (possible missed events or mis-segmentation)"
            }
            std::cmp::Ordering::Less => {
                "detected events exceed observed change (possible spurious detections)"
            }
        }
    }
}

/// Aggregate summary over all transitions.
///
/// Totals are summed first and the percent recomputed on the totals;
/// averaging per-transition percentages would let near-zero-delta
/// transitions distort the figure.
pub fn summarize(results: &[ReconciliationResult]) -> [SummaryRow; 2] {
    let mut actual = TopologyDelta::default();
    let mut expected = TopologyDelta::default();
    for r in results {
        actual.tips += r.actual.tips;
        actual.junctions += r.actual.junctions;
        expected.tips += r.expected.tips;
        expected.junctions += r.expected.junctions;
    }
    let discrepancy = actual - expected;
    [
        SummaryRow {
            metric: SummaryMetric::Tips,
            actual_total: actual.tips,
            expected_total: expected.tips,
            discrepancy: discrepancy.tips,
            percent_explained: percent_explained(actual.tips, discrepancy.tips),
        },
        SummaryRow {
            metric: SummaryMetric::Junctions,
            actual_total: actual.junctions,
            expected_total: expected.junctions,
            discrepancy: discrepancy.junctions,
            percent_explained: percent_explained(actual.junctions, discrepancy.junctions),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: u32, tips: i64, junctions: i64) -> Transition {
        Transition {
            from_frame: from,
            to_frame: from + 1,
            delta_tips: tips,
            delta_junctions: junctions,
            delta_components: None,
        }
    }

    #[test]
    fn test_no_detections_explain_nothing() {
        // Tips 5->4, junctions 3->4 with zero detected events.
        let r = reconcile_transition(&transition(1, -1, 1), &EventCountVector::zero());
        assert_eq!(r.expected, TopologyDelta::new(0, 0));
        assert_eq!(r.discrepancy, TopologyDelta::new(-1, 1));
        assert_eq!(r.percent_explained_tips, 0.0);
        assert_eq!(r.percent_explained_junctions, 0.0);
    }

    #[test]
    fn test_exact_detection_explains_fully() {
        let detected = EventCountVector::new([1, 0, 0, 0, 0, 0]);
        let r = reconcile_transition(&transition(1, -1, 1), &detected);
        assert_eq!(r.expected, TopologyDelta::new(-1, 1));
        assert_eq!(r.discrepancy, TopologyDelta::new(0, 0));
        assert_eq!(r.percent_explained_tips, 100.0);
        assert_eq!(r.percent_explained_junctions, 100.0);
    }

    #[test]
    fn test_percent_explained_bounds() {
        for actual in -5..=5 {
            for discrepancy in -10..=10 {
                let pct = percent_explained(actual, discrepancy);
                assert!((0.0..=100.0).contains(&pct), "pct={pct}");
                assert_eq!(pct == 100.0, discrepancy == 0);
            }
        }
    }

    #[test]
    fn test_overshooting_discrepancy_reads_zero_not_negative() {
        assert_eq!(percent_explained(1, 3), 0.0);
        assert_eq!(percent_explained(0, 2), 0.0);
    }

    #[test]
    fn test_summary_recomputes_percent_on_totals() {
        // Two transitions with opposite tip deltas and no detections:
        // each explains 0% on its own, but the totals cancel to zero
        // discrepancy, so the aggregate reads 100% rather than the 0%
        // an average of per-transition percents would give.
        let transitions = [transition(1, 1, 0), transition(2, -1, 0)];
        let detected = [EventCountVector::zero(), EventCountVector::zero()];
        let results = reconcile_timeseries(&transitions, &detected);
        assert_eq!(results[0].percent_explained_tips, 0.0);
        assert_eq!(results[1].percent_explained_tips, 0.0);

        let summary = summarize(&results);
        assert_eq!(summary[0].metric, SummaryMetric::Tips);
        assert_eq!(summary[0].actual_total, 0);
        assert_eq!(summary[0].discrepancy, 0);
        assert_eq!(summary[0].percent_explained, 100.0);
    }

    #[test]
    fn test_summary_totals_accumulate() {
        let transitions = [transition(1, -1, 1), transition(2, -2, 0)];
        let detected = [
            EventCountVector::new([1, 0, 0, 0, 0, 0]),
            EventCountVector::zero(),
        ];
        let summary = summarize(&reconcile_timeseries(&transitions, &detected));
        assert_eq!(summary[0].actual_total, -3);
        assert_eq!(summary[0].expected_total, -1);
        assert_eq!(summary[0].discrepancy, -2);
        assert_eq!(summary[1].actual_total, 1);
        assert_eq!(summary[1].expected_total, 1);
        assert_eq!(summary[1].percent_explained, 100.0);
    }
}
