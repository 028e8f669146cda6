//! Per-frame metric extraction from node-degree tables.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::warn;

use crate::error::{Result, TopologyError};

/// One row of the input node-degree table: a single node in a single frame.
#[derive(Debug, Clone)]
pub struct NodeRow {
    pub frame_index: u32,
    pub node_id: u64,
    pub degree: usize,
    /// Neighbor node ids within the same frame, when the source table
    /// carries adjacency. Component counting needs this side input; degree
    /// alone cannot provide it.
    pub neighbors: Option<Vec<u64>>,
}

/// Topology metrics for one frame, immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetrics {
    pub frame_index: u32,
    /// Nodes of degree 1.
    pub tip_count: usize,
    /// Nodes of degree ≥ 3.
    pub junction_count: usize,
    /// Connected subgraphs; `None` when any node of the frame lacks
    /// adjacency data; unknown is reported as unknown, never fabricated.
    pub component_count: Option<usize>,
}

/// Compute metrics for a single frame's rows.
///
/// Fails with `MalformedFrame` on an empty frame, duplicate node ids, or an
/// adjacency entry referencing a node absent from the frame.
pub fn extract_frame_metrics(frame_index: u32, rows: &[&NodeRow]) -> Result<FrameMetrics> {
    if rows.is_empty() {
        return Err(TopologyError::malformed_frame(frame_index, "frame has zero nodes"));
    }

    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.node_id) {
            return Err(TopologyError::malformed_frame(
                frame_index,
                format!("duplicate node id {}", row.node_id),
            ));
        }
    }

    let tip_count = rows.iter().filter(|r| r.degree == 1).count();
    let junction_count = rows.iter().filter(|r| r.degree >= 3).count();

    let component_count = if rows.iter().all(|r| r.neighbors.is_some()) {
        Some(count_components(frame_index, rows)?)
    } else {
        None
    };

    Ok(FrameMetrics {
        frame_index,
        tip_count,
        junction_count,
        component_count,
    })
}

/// Count connected subgraphs with union-find over the frame's adjacency.
fn count_components(frame_index: u32, rows: &[&NodeRow]) -> Result<usize> {
    let index_of: HashMap<u64, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.node_id, i))
        .collect();

    let n = rows.len();
    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank = vec![0usize; n];

    fn find(parent: &mut [usize], i: usize) -> usize {
        if parent[i] != i {
            parent[i] = find(parent, parent[i]);
        }
        parent[i]
    }

    fn union(parent: &mut [usize], rank: &mut [usize], x: usize, y: usize) {
        let rx = find(parent, x);
        let ry = find(parent, y);
        if rx != ry {
            if rank[rx] < rank[ry] {
                parent[rx] = ry;
            } else if rank[rx] > rank[ry] {
                parent[ry] = rx;
            } else {
                parent[ry] = rx;
                rank[rx] += 1;
            }
        }
    }

    for (i, row) in rows.iter().enumerate() {
        let neighbors = row.neighbors.as_deref().unwrap_or_default();
        for &neighbor in neighbors {
            let Some(&j) = index_of.get(&neighbor) else {
                return Err(TopologyError::malformed_frame(
                    frame_index,
                    format!(
                        "node {} lists neighbor {} not present in frame",
                        row.node_id, neighbor
                    ),
                ));
            };
            union(&mut parent, &mut rank, i, j);
        }
    }

    let mut roots = HashSet::new();
    for i in 0..n {
        roots.insert(find(&mut parent, i));
    }
    Ok(roots.len())
}

/// Extract metrics for every frame of a time series, ascending frame order.
///
/// Malformed frames are isolated: each is skipped, logged, and returned in
/// the diagnostics list while the remaining frames proceed.
pub fn extract_timeseries_metrics(rows: &[NodeRow]) -> (Vec<FrameMetrics>, Vec<TopologyError>) {
    let mut by_frame: BTreeMap<u32, Vec<&NodeRow>> = BTreeMap::new();
    for row in rows {
        by_frame.entry(row.frame_index).or_default().push(row);
    }

    let mut frames = Vec::with_capacity(by_frame.len());
    let mut diagnostics = Vec::new();
    for (frame_index, frame_rows) in &by_frame {
        match extract_frame_metrics(*frame_index, frame_rows) {
            Ok(metrics) => frames.push(metrics),
            Err(err) => {
                warn!(frame_index, %err, "skipping malformed frame");
                diagnostics.push(err);
            }
        }
    }
    (frames, diagnostics)
}
