use crate::report::{node_table, stats_summary, trace_summary, trace_table};
use crate::{write_traces_with_manifest, GraphFile, RunManifest};
use anyhow::Context;
use contagion_core::{ConfigError, CountColumns, Ensemble, Graph, SeededDraws, Trace};
use contagion_sampler::{
    run_outcome, run_repetitions, Action, EnsembleStats, ModelArgs, ModelConfig, RunConfig,
    RunOutcome, SimulationEnsemble, SimulationOutcome, SirsPolicy,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Display;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "contagion")]
#[command(about = "Threshold cascade and SIRS epidemic simulation on directed graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate a cascade or an epidemic on a graph
    Run {
        /// JSON graph file
        graph: PathBuf,

        /// Propagation model
        #[arg(long, value_enum)]
        action: ActionType,

        /// Comma-separated initiator node ids
        #[arg(long)]
        initiator: String,

        /// Cascade threshold (0-1)
        #[arg(long)]
        threshold: Option<f64>,

        /// Per-contact infection probability (0-1)
        #[arg(long, alias = "probability_of_infection")]
        probability_of_infection: Option<f64>,

        /// Number of time steps to simulate
        #[arg(long)]
        lifespan: Option<usize>,

        /// Sheltering rate (0-1)
        #[arg(long)]
        shelter: Option<f64>,

        /// Vaccination rate (0-1)
        #[arg(long)]
        vaccinations: Option<f64>,

        /// Step limit overriding the model default
        #[arg(long)]
        max_steps: Option<usize>,

        /// Random seed (drawn from entropy and reported when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Independent Monte Carlo repetitions
        #[arg(long, default_value = "1")]
        repetitions: usize,

        /// SIRS policy parameters (JSON): infectious_duration,
        /// immunity_duration, shelter_efficacy
        #[arg(long)]
        params: Option<String>,

        /// Output Parquet file; the manifest is written alongside
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the per-step trace table and the final state of every node
        #[arg(long)]
        plot: bool,

        /// Print the state of every node after each step
        #[arg(long)]
        interactive: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ActionType {
    #[value(name = "cascade")]
    Cascade,
    #[value(name = "covid")]
    Covid,
}

impl From<ActionType> for Action {
    fn from(action: ActionType) -> Self {
        match action {
            ActionType::Cascade => Action::Cascade,
            ActionType::Covid => Action::Covid,
        }
    }
}

/// Arguments of the `run` subcommand
#[derive(Clone, Debug)]
pub struct RunArgs {
    pub graph: PathBuf,
    pub action: ActionType,
    pub initiator: String,
    pub model: ModelArgs,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    pub repetitions: usize,
    pub params: Option<String>,
    pub out: Option<PathBuf>,
    pub plot: bool,
    pub interactive: bool,
}

/// Build the run configuration; fails before any simulation work.
pub fn build_config(args: &RunArgs) -> anyhow::Result<RunConfig> {
    if args.repetitions == 0 {
        return Err(ConfigError::InvalidCount { name: "repetitions", value: 0 }.into());
    }

    let mut model_args = args.model.clone();
    if let Some(params) = &args.params {
        model_args.policy = serde_json::from_str::<SirsPolicy>(params)
            .context("--params must be a JSON object of SIRS policy parameters")?;
    }

    let model = ModelConfig::from_args(args.action.into(), &model_args)?;
    let mut config = RunConfig::new(RunConfig::parse_initiators(&args.initiator), model);
    config.max_steps = args.max_steps;
    config.seed = Some(args.seed.unwrap_or_else(SeededDraws::entropy_seed));
    Ok(config)
}

pub async fn run_simulation_command(args: RunArgs) -> anyhow::Result<()> {
    let graph = GraphFile::load(&args.graph)?;
    let config = build_config(&args)?;
    let seed = config.seed.unwrap_or_default();
    let repetitions = args.repetitions;

    println!("Contagion Simulation");
    println!("====================");
    println!("Graph: {:?} ({} nodes, {} edges)", args.graph, graph.num_nodes(), graph.num_edges());
    println!("Action: {}", config.model.action().as_str());
    println!("Initiators: {}", config.initiators.join(", "));
    println!("Model: {:?}", config.model);
    println!("Seed: {}", seed);
    println!("Repetitions: {}", repetitions);

    let manifest = RunManifest::new(&config, seed, repetitions, &graph)?;

    if repetitions == 1 {
        match run_outcome(&graph, &config, args.interactive)? {
            SimulationOutcome::Cascade(outcome) => report_single(&outcome, &graph, &manifest, &args)?,
            SimulationOutcome::Covid(outcome) => report_single(&outcome, &graph, &manifest, &args)?,
        }
    } else {
        if args.interactive {
            warn!("--interactive only applies to single runs; ignored with {} repetitions", repetitions);
        }
        match run_repetitions(&graph, &config, repetitions)?.1 {
            SimulationEnsemble::Cascade(ensemble) => {
                report_ensemble(&ensemble, &args)?;
                write_output(&ensemble.traces, &manifest, &args)?;
            }
            SimulationEnsemble::Covid(ensemble) => {
                report_ensemble(&ensemble, &args)?;
                write_output(&ensemble.traces, &manifest, &args)?;
            }
        }
    }

    println!("✓ Simulation completed successfully!");
    Ok(())
}

fn report_single<N: Display, C: CountColumns>(
    outcome: &RunOutcome<N, C>,
    graph: &Graph,
    manifest: &RunManifest,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let trace = &outcome.trace;
    if args.interactive {
        for (step, states) in trace.steps.iter().zip(&outcome.snapshots) {
            println!();
            println!("Step {}", step);
            print!("{}", node_table(graph, states));
        }
    }

    println!();
    print!("{}", trace_summary(trace));
    if args.plot {
        println!();
        print!("{}", trace_table(trace));
        println!();
        println!("Final node states");
        print!("{}", node_table(graph, &outcome.final_states));
    }
    write_output(std::slice::from_ref(trace), manifest, args)
}

fn report_ensemble<C: CountColumns>(ensemble: &Ensemble<C>, args: &RunArgs) -> anyhow::Result<()> {
    println!();
    print!("{}", stats_summary(&EnsembleStats::from_ensemble(ensemble)));
    if args.plot {
        if let Some(first) = ensemble.traces.first() {
            warn!("--plot shows repetition 0 only; per-node states are reported for single runs");
            println!();
            println!("Repetition 0");
            print!("{}", trace_table(first));
        }
    }
    Ok(())
}

fn write_output<C: CountColumns>(
    traces: &[Trace<C>],
    manifest: &RunManifest,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let Some(out) = &args.out else {
        return Ok(());
    };

    let parquet_path = out
        .to_str()
        .context("output path is not valid UTF-8")?;
    let manifest_path = out.with_extension("manifest.json");
    let manifest_path_str = manifest_path
        .to_str()
        .context("manifest path is not valid UTF-8")?;

    write_traces_with_manifest(traces, manifest, parquet_path, manifest_path_str)
}
