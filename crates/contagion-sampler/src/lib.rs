use contagion_core::{
    CascadeNode, CountColumns, DrawSource, Engine, Ensemble, EpidemicNode, Graph, NodeId,
    NodeStates, SeededDraws, SimError, Step, StopReason, Trace,
};
use contagion_models::{CascadeCounts, SirsCounts, SirsEpidemic, ThresholdCascade};
use rayon::prelude::*;
use tracing::{debug, info};

pub mod config;
pub mod stats;

pub use config::{Action, ModelArgs, ModelConfig, RunConfig, SirsPolicy};
pub use stats::EnsembleStats;

/// Stopping conditions applied between steps
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stopping {
    pub max_steps: Step,
}

impl Stopping {
    pub fn new(max_steps: Step) -> Self {
        Self { max_steps }
    }
}

/// Drives one engine through the step loop and records its trace
pub struct Sampler<E: Engine> {
    pub engine: E,
}

impl<E: Engine> Sampler<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Run a single trajectory with the given draw source.
    ///
    /// Step 0 holds the initial counts; each later entry holds the counts
    /// after that step was applied.
    pub fn run_single(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        stopping: &Stopping,
        draws: &mut impl DrawSource,
    ) -> Result<Trace<E::Counts>, SimError> {
        self.run_outcome(graph, initiators, stopping, draws, false)
            .map(|outcome| outcome.trace)
    }

    /// Like `run_single`, but keeps the final node states and, when
    /// `snapshots` is set, a copy of the store at every recorded step.
    pub fn run_outcome(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        stopping: &Stopping,
        draws: &mut impl DrawSource,
        snapshots: bool,
    ) -> Result<RunOutcome<E::Node, E::Counts>, SimError> {
        let mut states = self.engine.initialize(graph, initiators, draws)?;

        let mut trace = Trace::with_capacity(stopping.max_steps.min(1024) + 1);
        let mut kept = Vec::new();
        trace.push(0, self.engine.counts(&states));
        if snapshots {
            kept.push(states.clone());
        }

        let mut stop = StopReason::StepLimit;
        for step in 1..=stopping.max_steps {
            let report = self.engine.step(graph, &mut states, step, draws)?;
            debug!(step, changed = report.changed, counts = ?report.counts.values(), "step");
            trace.push(step, report.counts.clone());
            if snapshots {
                kept.push(states.clone());
            }

            if let Some(reason) = self.engine.is_terminated(&report) {
                stop = reason;
                break;
            }
        }

        trace.finish(stop);
        Ok(RunOutcome {
            trace,
            final_states: states,
            snapshots: kept,
        })
    }

    /// Run independent repetitions in parallel.
    ///
    /// Repetition `i` draws from `SeededDraws::from_run_id(global_seed, i)`
    /// and owns its state store, so the ensemble does not depend on
    /// thread count or scheduling.
    pub fn run_repetitions(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        stopping: &Stopping,
        repetitions: usize,
        global_seed: u64,
    ) -> Result<Ensemble<E::Counts>, SimError> {
        let traces = (0..repetitions)
            .into_par_iter()
            .map(|run_id| {
                let mut draws = SeededDraws::from_run_id(global_seed, run_id as u64);
                self.run_single(graph, initiators, stopping, &mut draws)
            })
            .collect::<Result<Vec<_>, SimError>>()?;

        Ok(Ensemble::new(traces))
    }
}

/// Trace of one trajectory together with the node states it left behind
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome<N, C> {
    pub trace: Trace<C>,
    pub final_states: NodeStates<N>,
    /// Store at each recorded step, aligned with `trace.steps`; empty unless requested
    pub snapshots: Vec<NodeStates<N>>,
}

/// Trace of whichever model a configuration selected
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationTrace {
    Cascade(Trace<CascadeCounts>),
    Covid(Trace<SirsCounts>),
}

impl SimulationTrace {
    pub fn stop(&self) -> Option<StopReason> {
        match self {
            SimulationTrace::Cascade(t) => t.stop,
            SimulationTrace::Covid(t) => t.stop,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SimulationTrace::Cascade(t) => t.len(),
            SimulationTrace::Covid(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimulationEnsemble {
    Cascade(Ensemble<CascadeCounts>),
    Covid(Ensemble<SirsCounts>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimulationOutcome {
    Cascade(RunOutcome<CascadeNode, CascadeCounts>),
    Covid(RunOutcome<EpidemicNode, SirsCounts>),
}

impl SimulationOutcome {
    pub fn into_trace(self) -> SimulationTrace {
        match self {
            SimulationOutcome::Cascade(outcome) => SimulationTrace::Cascade(outcome.trace),
            SimulationOutcome::Covid(outcome) => SimulationTrace::Covid(outcome.trace),
        }
    }
}

/// Validate `config` against `graph`, then run it once.
///
/// Nothing is stepped if validation fails.
pub fn run(graph: &Graph, config: &RunConfig) -> Result<SimulationTrace, SimError> {
    run_outcome(graph, config, false).map(SimulationOutcome::into_trace)
}

/// Same as `run`, keeping the final node states and optionally every
/// intermediate store.
pub fn run_outcome(
    graph: &Graph,
    config: &RunConfig,
    snapshots: bool,
) -> Result<SimulationOutcome, SimError> {
    let initiators = config.validate(graph)?;
    let mut draws = match config.seed {
        Some(seed) => SeededDraws::new(seed),
        None => SeededDraws::from_entropy(),
    };

    let outcome = match &config.model {
        ModelConfig::Cascade { threshold } => {
            let sampler = Sampler::new(ThresholdCascade::new(*threshold));
            let stopping = Stopping::new(config.step_limit(&sampler.engine, graph));
            SimulationOutcome::Cascade(
                sampler.run_outcome(graph, &initiators, &stopping, &mut draws, snapshots)?,
            )
        }
        ModelConfig::Covid(params) => {
            let sampler = Sampler::new(SirsEpidemic::new(params.clone()));
            let stopping = Stopping::new(config.step_limit(&sampler.engine, graph));
            SimulationOutcome::Covid(
                sampler.run_outcome(graph, &initiators, &stopping, &mut draws, snapshots)?,
            )
        }
    };

    let (steps, stop) = match &outcome {
        SimulationOutcome::Cascade(o) => (o.trace.final_step(), o.trace.stop),
        SimulationOutcome::Covid(o) => (o.trace.final_step(), o.trace.stop),
    };
    info!(
        action = config.model.action().as_str(),
        steps = steps.unwrap_or(0),
        stop = ?stop,
        "run finished"
    );
    Ok(outcome)
}

/// Validate `config`, then run `repetitions` independent copies of it.
///
/// Returns the global seed actually used alongside the ensemble.
pub fn run_repetitions(
    graph: &Graph,
    config: &RunConfig,
    repetitions: usize,
) -> Result<(u64, SimulationEnsemble), SimError> {
    let initiators = config.validate(graph)?;
    let global_seed = config.seed.unwrap_or_else(SeededDraws::entropy_seed);

    let ensemble = match &config.model {
        ModelConfig::Cascade { threshold } => {
            let sampler = Sampler::new(ThresholdCascade::new(*threshold));
            let stopping = Stopping::new(config.step_limit(&sampler.engine, graph));
            SimulationEnsemble::Cascade(sampler.run_repetitions(
                graph, &initiators, &stopping, repetitions, global_seed,
            )?)
        }
        ModelConfig::Covid(params) => {
            let sampler = Sampler::new(SirsEpidemic::new(params.clone()));
            let stopping = Stopping::new(config.step_limit(&sampler.engine, graph));
            SimulationEnsemble::Covid(sampler.run_repetitions(
                graph, &initiators, &stopping, repetitions, global_seed,
            )?)
        }
    };

    info!(
        action = config.model.action().as_str(),
        repetitions,
        global_seed,
        "repetitions finished"
    );
    Ok((global_seed, ensemble))
}
