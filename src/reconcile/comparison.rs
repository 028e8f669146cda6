//! Detected-vs-inferred comparison tables.

use tracing::warn;

use crate::error::{Result, TopologyError};
use crate::events::{EventCountVector, EventType, EVENT_TYPE_COUNT};
use crate::infer::InferenceBatch;
use crate::topology::Transition;

/// Signed per-type difference between detected and inferred counts.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonRow {
    pub event_type: EventType,
    pub detected: u64,
    pub inferred: u64,
    /// `inferred − detected`: positive flags under-detection of this event
    /// type by spatial matching, negative flags over-detection.
    pub difference: i64,
}

/// Per-transition comparison across all six event types.
#[derive(Debug, Clone, Copy)]
pub struct TransitionComparison {
    pub transition: Transition,
    pub rows: [ComparisonRow; EVENT_TYPE_COUNT],
}

impl TransitionComparison {
    /// Net signed difference across event types.
    pub fn total_difference(&self) -> i64 {
        self.rows.iter().map(|r| r.difference).sum()
    }
}

/// Compare one transition's detected and inferred vectors.
///
/// Fails with `MissingVector` when either side is absent; only this
/// comparison row is lost.
pub fn compare_transition(
    transition: &Transition,
    detected: Option<&EventCountVector>,
    inferred: Option<&EventCountVector>,
) -> Result<TransitionComparison> {
    let missing = |side: &'static str| TopologyError::MissingVector {
        from_frame: transition.from_frame,
        to_frame: transition.to_frame,
        side,
    };
    let detected = detected.ok_or_else(|| missing("detected"))?;
    let inferred = inferred.ok_or_else(|| missing("inferred"))?;

    let rows = EventType::ALL.map(|event_type| {
        let d = detected.get(event_type);
        let i = inferred.get(event_type);
        ComparisonRow {
            event_type,
            detected: d,
            inferred: i,
            difference: i as i64 - d as i64,
        }
    });
    Ok(TransitionComparison {
        transition: *transition,
        rows,
    })
}

/// Full comparison output: per-transition rows, aggregate totals, and the
/// diagnostics for rows that could not be formed.
#[derive(Debug)]
pub struct ComparisonReport {
    pub comparisons: Vec<TransitionComparison>,
    pub totals: [ComparisonRow; EVENT_TYPE_COUNT],
    pub skipped: Vec<(Transition, TopologyError)>,
}

/// Diff detected against inferred vectors for the whole series.
///
/// `detected` aligns with `transitions` by position; inferred vectors come
/// from the batch, so transitions left unresolved by the solver surface
/// here as skipped rows rather than disappearing.
pub fn compare_timeseries(
    transitions: &[Transition],
    detected: &[EventCountVector],
    inferred: &InferenceBatch,
) -> ComparisonReport {
    let mut comparisons = Vec::with_capacity(transitions.len());
    let mut skipped = Vec::new();
    for (i, transition) in transitions.iter().enumerate() {
        match compare_transition(transition, detected.get(i), inferred.vector_for(transition)) {
            Ok(comparison) => comparisons.push(comparison),
            Err(error) => {
                warn!(transition = %transition.label(), %error, "comparison row skipped");
                skipped.push((*transition, error));
            }
        }
    }

    let totals = EventType::ALL.map(|event_type| {
        let detected: u64 = comparisons
            .iter()
            .map(|c| c.rows[event_type.index()].detected)
            .sum();
        let inferred: u64 = comparisons
            .iter()
            .map(|c| c.rows[event_type.index()].inferred)
            .sum();
        ComparisonRow {
            event_type,
            detected,
            inferred,
            difference: inferred as i64 - detected as i64,
        }
    });

    ComparisonReport {
        comparisons,
        totals,
        skipped,
    }
}
