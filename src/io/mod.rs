//! Table I/O for the analysis pipeline.
//!
//! Reads the per-frame node-degree table and the per-type detected-event
//! tables produced by the spatial detector, and writes the output tables
//! the reporting layer consumes. All files are plain CSV with a header
//! row; parsing is quote-aware but otherwise deliberately small.

mod tables;

pub use tables::{
    detected_totals, read_detected_events, read_node_table, write_comparison,
    write_detected_summary, write_inferred_events, write_reconciliation_summary,
    write_topology_changes,
};
