//! Transitions: signed topology deltas between consecutive frames.

use crate::error::{Result, TopologyError};
use crate::events::TopologyDelta;
use crate::topology::FrameMetrics;

/// The interval between two consecutive frames of the time series.
///
/// Deltas are plain subtraction `metrics(to) − metrics(from)`; no smoothing
/// or clamping. Transitions partition the series into |frames|−1 ordered,
/// non-overlapping intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from_frame: u32,
    pub to_frame: u32,
    pub delta_tips: i64,
    pub delta_junctions: i64,
    /// Component delta; `None` when either endpoint's component count is
    /// unknown.
    pub delta_components: Option<i64>,
}

impl Transition {
    /// Compact `from->to` label used in reports and table rows.
    pub fn label(&self) -> String {
        format!("{}->{}", self.from_frame, self.to_frame)
    }

    /// The observed topology change of this transition.
    pub fn delta(&self) -> TopologyDelta {
        TopologyDelta::new(self.delta_tips, self.delta_junctions)
    }
}

/// Pair consecutive frames into transitions, in increasing frame order.
///
/// Fails with `InsufficientFrames` when fewer than two frames are supplied;
/// no transition can be formed and the run cannot proceed.
pub fn compute_transitions(frames: &[FrameMetrics]) -> Result<Vec<Transition>> {
    if frames.len() < 2 {
        return Err(TopologyError::InsufficientFrames { got: frames.len() });
    }

    Ok(frames
        .windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            Transition {
                from_frame: from.frame_index,
                to_frame: to.frame_index,
                delta_tips: to.tip_count as i64 - from.tip_count as i64,
                delta_junctions: to.junction_count as i64 - from.junction_count as i64,
                delta_components: match (from.component_count, to.component_count) {
                    (Some(a), Some(b)) => Some(b as i64 - a as i64),
                    _ => None,
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(frame_index: u32, tips: usize, junctions: usize) -> FrameMetrics {
        FrameMetrics {
            frame_index,
            tip_count: tips,
            junction_count: junctions,
            component_count: None,
        }
    }

    #[test]
    fn test_deltas_are_plain_subtraction() {
        let frames = vec![frame(1, 5, 3), frame(2, 4, 4), frame(3, 8, 1)];
        let transitions = compute_transitions(&frames).unwrap();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].delta_tips, -1);
        assert_eq!(transitions[0].delta_junctions, 1);
        assert_eq!(transitions[1].delta_tips, 4);
        assert_eq!(transitions[1].delta_junctions, -3);
        assert_eq!(transitions[0].label(), "1->2");
    }

    #[test]
    fn test_single_frame_is_insufficient() {
        let err = compute_transitions(&[frame(0, 1, 1)]).unwrap_err();
        assert!(matches!(err, TopologyError::InsufficientFrames { got: 1 }));
    }

    #[test]
    fn test_no_frames_is_insufficient() {
        assert!(compute_transitions(&[]).is_err());
    }

    #[test]
    fn test_component_delta_requires_both_endpoints() {
        let mut a = frame(0, 1, 1);
        let mut b = frame(1, 1, 1);
        a.component_count = Some(4);
        b.component_count = Some(2);
        let t = compute_transitions(&[a, b]).unwrap();
        assert_eq!(t[0].delta_components, Some(-2));

        b.component_count = None;
        let t = compute_transitions(&[a, b]).unwrap();
        assert_eq!(t[0].delta_components, None);
    }
}
