//! Batch topology & event analysis driver.
//!
//! Loads a time series' node-degree table and the spatial detector's event
//! tables from a base directory, then runs the full pipeline: per-frame
//! metrics, per-transition deltas, reconciliation of detected events
//! against observed topology, topology-driven event inference, and the
//! detected-vs-inferred comparison. Prints a sectioned report and writes
//! the output tables next to the inputs (or to `--out-dir`).

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use topo_event_dynamics::error::TopologyError;
use topo_event_dynamics::events::EventCountVector;
use topo_event_dynamics::infer::{infer_timeseries, InferenceBatch, InferenceMethod};
use topo_event_dynamics::io;
use topo_event_dynamics::reconcile::{
    compare_timeseries, reconcile_timeseries, summarize, ComparisonReport,
};
use topo_event_dynamics::topology::{
    compute_transitions, extract_timeseries_metrics, Transition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodChoice {
    #[value(name = "minimize_total")]
    MinimizeTotal,
    #[value(name = "minimize_discrepancy")]
    MinimizeDiscrepancy,
}

impl MethodChoice {
    fn method(self) -> InferenceMethod {
        match self {
            MethodChoice::MinimizeTotal => InferenceMethod::MinimizeTotal,
            MethodChoice::MinimizeDiscrepancy => InferenceMethod::MinimizeDiscrepancy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "topology_analysis")]
#[command(about = "Reconcile and infer network remodeling events from topology time series")]
struct Args {
    /// Base directory holding node_degrees.csv and the detected-event tables.
    base_dir: PathBuf,
    /// Spatial matching threshold of the external detector; recorded in the
    /// report for provenance, not used by this analysis.
    #[arg(long, env = "TOPOLOGY_DISTANCE_THRESHOLD", default_value_t = 5.0)]
    distance_threshold: f64,
    /// Output directory for the result tables (defaults to the base dir).
    #[arg(long, env = "TOPOLOGY_OUT_DIR")]
    out_dir: Option<PathBuf>,
    /// Inference objective; both methods run when omitted.
    #[arg(long, value_enum)]
    method: Option<MethodChoice>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    if run().is_err() {
        std::process::exit(1);
    }
}

fn run() -> Result<(), TopologyError> {
    let args = Args::parse();
    let out_dir = args.out_dir.clone().unwrap_or_else(|| args.base_dir.clone());

    banner("TOPOLOGY & EVENT ANALYSIS");
    println!("  Base directory:     {}", args.base_dir.display());
    println!("  Distance threshold: {}", args.distance_threshold);
    println!("  Output directory:   {}", out_dir.display());

    let outcome = (|| {
        fs::create_dir_all(&out_dir)
            .map_err(|source| TopologyError::io("creating output directory", &out_dir, source))?;

        // Frames and transitions.
        let node_table = args.base_dir.join("node_degrees.csv");
        let rows = io::read_node_table(&node_table)?;
        let (frames, frame_diagnostics) = extract_timeseries_metrics(&rows);
        let transitions = compute_transitions(&frames)?;

        banner("1. TIME SERIES");
        println!(
            "  {} nodes across {} frames, {} transitions",
            rows.len(),
            frames.len(),
            transitions.len()
        );
        for diagnostic in &frame_diagnostics {
            println!("  skipped: {diagnostic}");
        }

        // Detected events, bucketed per transition.
        let detected = io::read_detected_events(&args.base_dir, &transitions)?;
        let totals = io::detected_totals(&detected);
        banner("2. DETECTED EVENTS (spatial matching)");
        for (event_type, count) in totals.iter() {
            println!("  {:<20} {:>5}", event_type.label(), count);
        }
        io::write_detected_summary(&out_dir.join("detected_events_summary.csv"), &totals)?;

        // Reconciliation.
        let reconciled = reconcile_timeseries(&transitions, &detected);
        let summary = summarize(&reconciled);
        banner("3. TOPOLOGY RECONCILIATION");
        for row in &summary {
            println!("  {}:", row.metric.label());
            println!("    actual change:        {:+}", row.actual_total);
            println!("    expected from events: {:+}", row.expected_total);
            println!("    discrepancy:          {:+}", row.discrepancy);
            println!("    percent explained:    {:.1}%", row.percent_explained);
            println!("    -> {}", row.interpretation());
        }
        println!();
        println!("  changes by transition:");
        println!(
            "  {:<10} {:>6} {:>10} {:>8} {:>8}",
            "transition", "Δtips", "Δjunctions", "tips%", "junc%"
        );
        for r in &reconciled {
            println!(
                "  {:<10} {:>6} {:>10} {:>7.1}% {:>7.1}%",
                r.transition.label(),
                r.actual.tips,
                r.actual.junctions,
                r.percent_explained_tips,
                r.percent_explained_junctions
            );
        }
        io::write_topology_changes(
            &out_dir.join("topology_changes_by_transition.csv"),
            &frames,
            &transitions,
        )?;
        io::write_reconciliation_summary(
            &out_dir.join("topology_reconciliation_summary.csv"),
            &summary,
        )?;

        // Inference, one pass per selected objective.
        let methods: Vec<InferenceMethod> = match args.method {
            Some(choice) => vec![choice.method()],
            None => InferenceMethod::ALL.to_vec(),
        };
        for method in methods {
            let priors = match method {
                InferenceMethod::MinimizeTotal => None,
                InferenceMethod::MinimizeDiscrepancy => Some(detected.as_slice()),
            };
            let batch = infer_timeseries(&transitions, method, priors);
            let comparison = compare_timeseries(&transitions, &detected, &batch);
            print_inference(&transitions, &batch, &comparison);

            io::write_inferred_events(
                &out_dir.join(format!("topology_inferred_events_{}.csv", method.label())),
                &batch,
            )?;
            io::write_comparison(
                &out_dir.join(format!("comparison_{}.csv", method.label())),
                &comparison,
            )?;
        }

        banner("ANALYSIS COMPLETE");
        println!("  Results saved to {}", out_dir.display());
        Ok(())
    })();

    if let Err(ref err) = outcome {
        error!(%err, "analysis aborted");
    }
    outcome
}

fn print_inference(
    transitions: &[Transition],
    batch: &InferenceBatch,
    comparison: &ComparisonReport,
) {
    banner(&format!(
        "4. TOPOLOGY-DRIVEN INFERENCE ({})",
        batch.method.label()
    ));
    println!(
        "  {:<10} {:>6} {:>10}  {}",
        "transition", "Δtips", "Δjunctions", "inferred events"
    );
    for transition in transitions {
        match batch.vector_for(transition) {
            Some(vector) => println!(
                "  {:<10} {:>6} {:>10}  {}",
                transition.label(),
                transition.delta_tips,
                transition.delta_junctions,
                format_counts(vector)
            ),
            None => println!(
                "  {:<10} {:>6} {:>10}  unresolved",
                transition.label(),
                transition.delta_tips,
                transition.delta_junctions
            ),
        }
    }
    println!(
        "\n  resolved {}/{} transitions",
        batch.resolved.len(),
        transitions.len()
    );
    for unresolved in &batch.unresolved {
        println!("  unresolved: {}", unresolved.error);
    }

    println!("\n  detected vs. inferred totals:");
    println!(
        "  {:<20} {:>9} {:>9} {:>11}",
        "event type", "detected", "inferred", "difference"
    );
    for row in &comparison.totals {
        println!(
            "  {:<20} {:>9} {:>9} {:>+11}",
            row.event_type.label(),
            row.detected,
            row.inferred,
            row.difference
        );
    }
    for (transition, err) in &comparison.skipped {
        println!("  comparison skipped for {}: {err}", transition.label());
    }
}

fn format_counts(vector: &EventCountVector) -> String {
    vector
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(event_type, count)| format!("{}={}", event_type.label(), count))
        .collect::<Vec<_>>()
        .join(" ")
}

fn banner(title: &str) {
    println!("\n══════════════════════════════════════════════════════════════════");
    println!("  {title}");
    println!("══════════════════════════════════════════════════════════════════");
}
