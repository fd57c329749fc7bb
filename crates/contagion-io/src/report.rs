use contagion_core::{CountColumns, Graph, NodeStates, Trace};
use contagion_sampler::EnsembleStats;
use std::fmt::{Display, Write};

/// Per-step count table, one row per recorded step
pub fn trace_table<C: CountColumns>(trace: &Trace<C>) -> String {
    let columns = C::column_names();
    let widths: Vec<usize> = columns.iter().map(|c| c.len().max(6)).collect();

    let mut out = String::new();
    let _ = write!(out, "{:>6}", "step");
    for (name, width) in columns.iter().zip(&widths) {
        let _ = write!(out, "  {:>width$}", name, width = width);
    }
    out.push('\n');

    for (step, counts) in trace.iter() {
        let _ = write!(out, "{:>6}", step);
        for (value, width) in counts.values().iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", value, width = width);
        }
        out.push('\n');
    }
    out
}

/// One row per node: its label and its state in `states`
pub fn node_table<N: Display>(graph: &Graph, states: &NodeStates<N>) -> String {
    let width = graph.labels().iter().map(|l| l.len()).max().unwrap_or(0).max(4);

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  state", "node", width = width);
    for (label, node) in graph.labels().iter().zip(states.iter()) {
        let _ = writeln!(out, "{:<width$}  {}", label, node, width = width);
    }
    out
}

pub fn trace_summary<C: CountColumns>(trace: &Trace<C>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Steps run: {}", trace.final_step().unwrap_or(0));
    let _ = writeln!(out, "Stopped: {:?}", trace.stop);
    if let Some(last) = trace.final_counts() {
        for (name, value) in C::column_names().iter().zip(last.values()) {
            let _ = writeln!(out, "Final {}: {}", name, value);
        }
    }
    out
}

pub fn stats_summary(stats: &EnsembleStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Runs completed: {}", stats.n_runs);
    let _ = writeln!(out, "Mean steps run: {:.2}", stats.mean_final_step);
    for (i, name) in stats.columns.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}: mean final {:.2}, mean peak {:.2}",
            name, stats.mean_final[i], stats.mean_peak[i]
        );
    }
    for (reason, count) in &stats.stop_reasons {
        let _ = writeln!(out, "Stopped by {:?}: {}", reason, count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_core::{CascadeNode, StopReason};
    use contagion_models::SirsCounts;

    #[test]
    fn test_table_layout() {
        let mut trace = Trace::new();
        trace.push(0, SirsCounts { susceptible: 9, infected: 1, recovered: 0, vaccinated: 0 });
        trace.push(1, SirsCounts { susceptible: 7, infected: 2, recovered: 1, vaccinated: 0 });
        trace.finish(StopReason::StepLimit);

        let table = trace_table(&trace);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("susceptible") && lines[0].contains("vaccinated"));
        assert!(lines[2].trim_start().starts_with('1'));

        let summary = trace_summary(&trace);
        assert!(summary.contains("Final infected: 2"));
        assert!(summary.contains("StepLimit"));
    }

    #[test]
    fn test_node_table_lists_labels_in_order() {
        let graph = Graph::from_labeled_edges(&["alice", "bob"], &[("alice", "bob")]).unwrap();
        let states = NodeStates::new(vec![CascadeNode::initiator(), CascadeNode::default()]);

        let table = node_table(&graph, &states);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("alice") && lines[1].ends_with("active (step 0)"));
        assert!(lines[2].starts_with("bob") && lines[2].ends_with("inactive"));
    }
}
