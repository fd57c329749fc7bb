use crate::{DrawSource, Graph, NodeId, NodeStates, SimError, Step, StopReason, CountColumns};

/// Outcome of a single synchronous step
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport<C> {
    /// Whether any node changed state during the step
    pub changed: bool,
    /// Aggregate counts after the step was applied
    pub counts: C,
}

/// A propagation model advanced one discrete step at a time.
///
/// Implementations compute every transition of a step from the state at
/// the start of that step and apply them together at the end.
pub trait Engine: Send + Sync {
    type Node: Clone + Send;
    type Counts: CountColumns + Clone + std::fmt::Debug + Send;

    /// Build the step-0 state: initiators seeded, interventions assigned.
    fn initialize(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        draws: &mut impl DrawSource,
    ) -> Result<NodeStates<Self::Node>, SimError>;

    /// Advance `states` from step `step - 1` to step `step`.
    fn step(
        &self,
        graph: &Graph,
        states: &mut NodeStates<Self::Node>,
        step: Step,
        draws: &mut impl DrawSource,
    ) -> Result<StepReport<Self::Counts>, SimError>;

    fn counts(&self, states: &NodeStates<Self::Node>) -> Self::Counts;

    /// `Some(reason)` once the model has nothing left to do
    fn is_terminated(&self, report: &StepReport<Self::Counts>) -> Option<StopReason>;

    /// Maximum number of steps when the run configuration sets none
    fn default_step_limit(&self, graph: &Graph) -> Step;
}

/// Guard shared by engines: the store must cover exactly the graph's nodes.
pub fn check_store_size<T>(graph: &Graph, states: &NodeStates<T>, step: Step) -> Result<(), SimError> {
    if states.len() != graph.num_nodes() {
        return Err(SimError::state_size(step, graph.num_nodes(), states.len()));
    }
    Ok(())
}
