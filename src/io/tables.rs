//! CSV reading and writing for input and output tables.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TopologyError};
use crate::events::{EventCountVector, EventType, EVENT_TYPE_COUNT};
use crate::infer::InferenceBatch;
use crate::reconcile::{ComparisonReport, SummaryRow};
use crate::topology::{FrameMetrics, NodeRow, Transition};

/// A parsed CSV file: header plus string cells with source line numbers.
struct Table {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Split one CSV line, honoring double-quoted fields with embedded commas
/// and doubled quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn read_table(path: &Path) -> Result<Table> {
    let contents = fs::read_to_string(path)
        .map_err(|source| TopologyError::io("reading table", path, source))?;
    let mut lines = contents.lines().enumerate();
    let header = match lines.next() {
        Some((_, line)) => split_fields(line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => return Err(TopologyError::table(path, 1, "file is empty")),
    };
    let mut rows = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(line)
            .into_iter()
            .map(|f| f.trim().to_string())
            .collect::<Vec<_>>();
        rows.push((idx + 1, fields));
    }
    Ok(Table { header, rows })
}

fn parse_cell<T: std::str::FromStr>(
    path: &Path,
    line: usize,
    name: &str,
    cell: &str,
) -> Result<T> {
    cell.parse().map_err(|_| {
        TopologyError::table(path, line, format!("cannot parse {name} from '{cell}'"))
    })
}

/// Parse a neighbor list cell: bracketed (`[3, 5]`) or separator-joined
/// (`3;5`) node ids; an empty cell is an isolated node.
fn parse_neighbors(path: &Path, line: usize, cell: &str) -> Result<Vec<u64>> {
    let inner = cell.trim().trim_start_matches('[').trim_end_matches(']');
    let mut neighbors = Vec::new();
    for token in inner.split([',', ';']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        neighbors.push(parse_cell(path, line, "neighbor id", token)?);
    }
    Ok(neighbors)
}

/// Read the per-frame node-degree table.
///
/// Requires `frame_index` (alias `time_point`) and `node_id` columns. The
/// `degree` column may be omitted when an `adjacencies` column is present,
/// in which case the degree is the adjacency length.
pub fn read_node_table(path: &Path) -> Result<Vec<NodeRow>> {
    let table = read_table(path)?;
    let frame_col = table
        .column("frame_index")
        .or_else(|| table.column("time_point"))
        .ok_or_else(|| {
            TopologyError::table(path, 1, "missing 'frame_index' (or 'time_point') column")
        })?;
    let node_col = table
        .column("node_id")
        .ok_or_else(|| TopologyError::table(path, 1, "missing 'node_id' column"))?;
    let degree_col = table.column("degree");
    let adjacency_col = table.column("adjacencies");
    if degree_col.is_none() && adjacency_col.is_none() {
        return Err(TopologyError::table(
            path,
            1,
            "need a 'degree' or 'adjacencies' column",
        ));
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (line, cells) in &table.rows {
        let line = *line;
        let cell = |col: usize| -> &str { cells.get(col).map(String::as_str).unwrap_or("") };

        let frame_index = parse_cell(path, line, "frame index", cell(frame_col))?;
        let node_id = parse_cell(path, line, "node id", cell(node_col))?;
        let neighbors = match adjacency_col {
            Some(col) => Some(parse_neighbors(path, line, cell(col))?),
            None => None,
        };
        let degree = match degree_col {
            Some(col) => parse_cell(path, line, "degree", cell(col))?,
            // Column presence was checked above; derive from adjacency.
            None => neighbors.as_ref().map(Vec::len).unwrap_or(0),
        };

        rows.push(NodeRow {
            frame_index,
            node_id,
            degree,
            neighbors,
        });
    }
    info!(path = %path.display(), rows = rows.len(), "loaded node-degree table");
    Ok(rows)
}

/// Read the detected-event tables and bucket them per transition.
///
/// Each event type lives in `<label>_events.csv` under `dir` with at least
/// `timepoint_1` and `timepoint_2` columns; one row is one detected event.
/// A missing per-type table means zero detections of that type: the
/// spatial detector only writes tables for event types it observed.
pub fn read_detected_events(dir: &Path, transitions: &[Transition]) -> Result<Vec<EventCountVector>> {
    let mut per_transition = vec![[0u64; EVENT_TYPE_COUNT]; transitions.len()];

    for event_type in EventType::ALL {
        let path = dir.join(format!("{}_events.csv", event_type.label()));
        if !path.exists() {
            debug!(path = %path.display(), "no detections table for event type");
            continue;
        }
        let table = read_table(&path)?;
        let t1_col = table
            .column("timepoint_1")
            .ok_or_else(|| TopologyError::table(&path, 1, "missing 'timepoint_1' column"))?;
        let t2_col = table
            .column("timepoint_2")
            .ok_or_else(|| TopologyError::table(&path, 1, "missing 'timepoint_2' column"))?;

        for (line, cells) in &table.rows {
            let line = *line;
            let t1: u32 = parse_cell(
                &path,
                line,
                "timepoint_1",
                cells.get(t1_col).map(String::as_str).unwrap_or(""),
            )?;
            let t2: u32 = parse_cell(
                &path,
                line,
                "timepoint_2",
                cells.get(t2_col).map(String::as_str).unwrap_or(""),
            )?;
            if let Some(idx) = transitions
                .iter()
                .position(|t| t.from_frame == t1 && t.to_frame == t2)
            {
                per_transition[idx][event_type.index()] += 1;
            } else {
                debug!(
                    path = %path.display(), line, t1, t2,
                    "detected event does not match any transition"
                );
            }
        }
    }

    Ok(per_transition.into_iter().map(EventCountVector::new).collect())
}

/// Total detected counts across all transitions.
pub fn detected_totals(detected: &[EventCountVector]) -> EventCountVector {
    let mut totals = [0u64; EVENT_TYPE_COUNT];
    for vector in detected {
        for (i, count) in vector.counts().iter().enumerate() {
            totals[i] += count;
        }
    }
    EventCountVector::new(totals)
}

fn create(path: &Path) -> Result<fs::File> {
    fs::File::create(path).map_err(|source| TopologyError::io("creating table", path, source))
}

fn persist(path: &Path, result: std::io::Result<()>) -> Result<()> {
    result.map_err(|source| TopologyError::io("writing table", path, source))?;
    info!(path = %path.display(), "wrote table");
    Ok(())
}

fn optional(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the per-transition topology change table.
pub fn write_topology_changes(
    path: &Path,
    frames: &[FrameMetrics],
    transitions: &[Transition],
) -> Result<()> {
    let frame = |index: u32| frames.iter().find(|f| f.frame_index == index);
    let mut out = create(path)?;
    let result = (|| {
        writeln!(
            out,
            "transition,tips_t1,tips_t2,delta_tips,junctions_t1,junctions_t2,\
             delta_junctions,delta_components"
        )?;
        for t in transitions {
            let (from, to) = (frame(t.from_frame), frame(t.to_frame));
            writeln!(
                out,
                "{},{},{},{},{},{},{},{}",
                t.label(),
                from.map_or(String::new(), |f| f.tip_count.to_string()),
                to.map_or(String::new(), |f| f.tip_count.to_string()),
                t.delta_tips,
                from.map_or(String::new(), |f| f.junction_count.to_string()),
                to.map_or(String::new(), |f| f.junction_count.to_string()),
                t.delta_junctions,
                optional(t.delta_components),
            )?;
        }
        Ok(())
    })();
    persist(path, result)
}

/// Write the aggregate reconciliation summary table.
pub fn write_reconciliation_summary(path: &Path, summary: &[SummaryRow]) -> Result<()> {
    let mut out = create(path)?;
    let result = (|| {
        writeln!(
            out,
            "metric,actual_total,expected_total,discrepancy,percent_explained"
        )?;
        for row in summary {
            writeln!(
                out,
                "{},{},{},{},{:.1}",
                row.metric.label(),
                row.actual_total,
                row.expected_total,
                row.discrepancy,
                row.percent_explained,
            )?;
        }
        Ok(())
    })();
    persist(path, result)
}

/// Write the inferred-events table for one method.
///
/// Unresolved transitions are not dropped: they appear with empty counts
/// and an explicit `unresolved` status.
pub fn write_inferred_events(path: &Path, batch: &InferenceBatch) -> Result<()> {
    enum Row<'a> {
        Resolved(&'a crate::infer::InferenceResult),
        Unresolved(&'a Transition),
    }
    let mut rows: Vec<(&Transition, Row)> = batch
        .resolved
        .iter()
        .map(|r| (&r.transition, Row::Resolved(r)))
        .chain(
            batch
                .unresolved
                .iter()
                .map(|u| (&u.transition, Row::Unresolved(&u.transition))),
        )
        .collect();
    rows.sort_by_key(|(t, _)| (t.from_frame, t.to_frame));

    let mut out = create(path)?;
    let result = (|| {
        write!(out, "transition,delta_tips,delta_junctions")?;
        for event_type in EventType::ALL {
            write!(out, ",{}", event_type.label())?;
        }
        writeln!(out, ",status")?;
        for (transition, row) in &rows {
            write!(
                out,
                "{},{},{}",
                transition.label(),
                transition.delta_tips,
                transition.delta_junctions
            )?;
            match row {
                Row::Resolved(result) => {
                    for count in result.inferred.counts() {
                        write!(out, ",{count}")?;
                    }
                    writeln!(out, ",resolved")?;
                }
                Row::Unresolved(_) => {
                    for _ in 0..EVENT_TYPE_COUNT {
                        write!(out, ",")?;
                    }
                    writeln!(out, ",unresolved")?;
                }
            }
        }
        Ok(())
    })();
    persist(path, result)
}

/// Write the per-transition detected-vs-inferred comparison table.
pub fn write_comparison(path: &Path, report: &ComparisonReport) -> Result<()> {
    let mut out = create(path)?;
    let result = (|| {
        writeln!(
            out,
            "transition,event_type,detected_count,inferred_count,difference"
        )?;
        for comparison in &report.comparisons {
            for row in &comparison.rows {
                writeln!(
                    out,
                    "{},{},{},{},{}",
                    comparison.transition.label(),
                    row.event_type.label(),
                    row.detected,
                    row.inferred,
                    row.difference,
                )?;
            }
        }
        for row in &report.totals {
            writeln!(
                out,
                "total,{},{},{},{}",
                row.event_type.label(),
                row.detected,
                row.inferred,
                row.difference,
            )?;
        }
        Ok(())
    })();
    persist(path, result)
}

/// Write the one-row detected-event totals table.
pub fn write_detected_summary(path: &Path, totals: &EventCountVector) -> Result<()> {
    let mut out = create(path)?;
    let result = (|| {
        let header: Vec<&str> = EventType::ALL.iter().map(|e| e.label()).collect();
        writeln!(out, "{}", header.join(","))?;
        let counts: Vec<String> = totals.counts().iter().map(u64::to_string).collect();
        writeln!(out, "{}", counts.join(","))?;
        Ok(())
    })();
    persist(path, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{infer_timeseries, InferenceMethod};
    use tempfile::tempdir;

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
    fn test_read_node_table_with_degree_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("node_degrees.csv");
        fs::write(&path, "frame_index,node_id,degree\n1,10,1\n1,11,3\n2,10,2\n").unwrap();
        let rows = read_node_table(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].degree, 3);
        assert!(rows[0].neighbors.is_none());
    }

    #[test]
    fn test_read_node_table_derives_degree_from_adjacency() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("node_degrees.csv");
        fs::write(
            &path,
            "time_point,node_id,adjacencies\n1,10,\"[11, 12]\"\n1,11,[10]\n1,12,[10]\n",
        )
        .unwrap();
        let rows = read_node_table(&path).unwrap();
        assert_eq!(rows[0].degree, 2);
        assert_eq!(rows[0].neighbors.as_deref(), Some(&[11, 12][..]));
        assert_eq!(rows[1].degree, 1);
    }

    #[test]
    fn test_read_node_table_rejects_missing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "frame_index,node_id\n1,10\n").unwrap();
        assert!(matches!(
            read_node_table(&path),
            Err(TopologyError::Table { .. })
        ));
    }

    #[test]
    fn test_read_detected_events_buckets_by_transition() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tip_edge_fusion_events.csv"),
            "timepoint_1,timepoint_2,position,degree_before,degree_after\n\
             1,2,\"[0.0, 1.0, 2.0]\",1,3\n\
             1,2,\"[4.0, 1.0, 0.0]\",1,3\n\
             2,3,\"[2.0, 2.0, 2.0]\",1,4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("retraction_events.csv"),
            "timepoint_1,timepoint_2,position_1,position_2,distance\n2,3,\"[0,0,0]\",\"[1,1,1]\",1.7\n",
        )
        .unwrap();

        let transitions = vec![transition(1, -2, 2), transition(2, -2, 0)];
        let detected = read_detected_events(dir.path(), &transitions).unwrap();
        assert_eq!(detected[0].get(EventType::TipEdgeFusion), 2);
        assert_eq!(detected[1].get(EventType::TipEdgeFusion), 1);
        assert_eq!(detected[1].get(EventType::Retraction), 1);
        assert_eq!(detected[0].get(EventType::Retraction), 0);

        let totals = detected_totals(&detected);
        assert_eq!(totals.get(EventType::TipEdgeFusion), 3);
        assert_eq!(totals.total(), 4);
    }

    #[test]
    fn test_inferred_table_marks_unresolved_transitions() {
        let dir = tempdir().unwrap();
        let transitions = vec![transition(1, -1, 1), transition(2, 1, 0)];
        let batch = infer_timeseries(&transitions, InferenceMethod::MinimizeTotal, None);
        let path = dir.path().join("inferred.csv");
        write_inferred_events(&path, &batch).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1->2,-1,1,1,0,0,0,0,0,resolved"));
        assert!(lines[2].starts_with("2->3,1,0,,,,,,,unresolved"));
    }

    #[test]
    fn test_summary_and_changes_round_trip() {
        let dir = tempdir().unwrap();
        let frames = vec![
            FrameMetrics {
                frame_index: 1,
                tip_count: 5,
                junction_count: 3,
                component_count: Some(2),
            },
            FrameMetrics {
                frame_index: 2,
                tip_count: 4,
                junction_count: 4,
                component_count: Some(2),
            },
        ];
        let transitions = vec![Transition {
            from_frame: 1,
            to_frame: 2,
            delta_tips: -1,
            delta_junctions: 1,
            delta_components: Some(0),
        }];
        let path = dir.path().join("changes.csv");
        write_topology_changes(&path, &frames, &transitions).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("1->2,5,4,-1,3,4,1,0"));
    }
}
