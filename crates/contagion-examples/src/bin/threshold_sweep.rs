use contagion_core::Graph;
use contagion_sampler::{run, ModelConfig, RunConfig, SimulationTrace};
use clap::Parser;
use anyhow::{bail, Result};

#[derive(Parser, Debug)]
#[command(author, version, about = "Final cascade size as the adoption threshold varies")]
struct Args {
    #[arg(long, default_value_t = 200)]
    nodes: usize,

    /// Neighbours linked on each side
    #[arg(long, default_value_t = 2)]
    k: usize,

    /// Number of contiguous initiators starting at node 0
    #[arg(long, default_value_t = 2)]
    initiators: usize,

    #[arg(long, default_value_t = 21)]
    levels: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let graph = Graph::ring_lattice(args.nodes, args.k)?;
    let initiators: Vec<String> = (0..args.initiators.min(args.nodes)).map(|i| i.to_string()).collect();
    let levels = args.levels.max(2);

    println!("Threshold sweep: {} nodes, {} initiators", graph.num_nodes(), initiators.len());
    println!("{:>10}  {:>8}  {:>8}", "threshold", "active", "rounds");

    for level in 0..levels {
        let threshold = level as f64 / (levels - 1) as f64;
        let config = RunConfig::new(initiators.clone(), ModelConfig::Cascade { threshold });

        let trace = match run(&graph, &config)? {
            SimulationTrace::Cascade(trace) => trace,
            SimulationTrace::Covid(_) => bail!("cascade config produced an epidemic trace"),
        };

        let active = trace.final_counts().map(|c| c.active).unwrap_or(0);
        // The last round is the one that observed the fixed point
        let rounds = trace.final_step().unwrap_or(0).saturating_sub(1);
        println!("{:>10.2}  {:>8}  {:>8}", threshold, active, rounds);
    }

    Ok(())
}
