use contagion_core::engine::check_store_size;
use contagion_core::{
    CascadeNode, ConfigError, CountColumns, DrawSource, Engine, Graph, NodeId, NodeStates,
    SimError, Step, StepReport, StopReason,
};
use serde::{Serialize, Deserialize};

/// Linear threshold cascade: an inactive node adopts once the active share
/// of its in-neighbours reaches `threshold`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCascade {
    pub threshold: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeCounts {
    pub active: u64,
    pub inactive: u64,
}

impl CountColumns for CascadeCounts {
    fn column_names() -> &'static [&'static str] {
        &["active", "inactive"]
    }

    fn values(&self) -> Vec<u64> {
        vec![self.active, self.inactive]
    }
}

impl ThresholdCascade {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::check_fraction("threshold", self.threshold)
    }

    /// One synchronous round. Returns whether any node activated.
    pub fn advance(
        &self,
        graph: &Graph,
        states: &mut NodeStates<CascadeNode>,
        step: Step,
    ) -> Result<bool, SimError> {
        check_store_size(graph, states, step)?;

        let current: &NodeStates<CascadeNode> = states;
        let newly_active: Vec<NodeId> = graph
            .node_ids()
            .filter(|&v| !current[v].is_active() && self.reaches_threshold(graph, current, v))
            .collect();

        for &v in &newly_active {
            states[v].activated_at = Some(step);
        }

        Ok(!newly_active.is_empty())
    }

    /// Nodes without in-neighbours never qualify.
    fn reaches_threshold(&self, graph: &Graph, states: &NodeStates<CascadeNode>, v: NodeId) -> bool {
        let preds = graph.predecessors(v);
        if preds.is_empty() {
            return false;
        }
        let active = preds.iter().filter(|&&u| states[u].is_active()).count();
        active as f64 / preds.len() as f64 >= self.threshold
    }
}

impl Engine for ThresholdCascade {
    type Node = CascadeNode;
    type Counts = CascadeCounts;

    fn initialize(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        _draws: &mut impl DrawSource,
    ) -> Result<NodeStates<CascadeNode>, SimError> {
        let mut states = NodeStates::filled(graph.num_nodes(), CascadeNode::default());
        for &id in initiators {
            match states.0.get_mut(id) {
                Some(node) => *node = CascadeNode::initiator(),
                None => return Err(SimError::node(0, id, "initiator outside the graph")),
            }
        }
        Ok(states)
    }

    fn step(
        &self,
        graph: &Graph,
        states: &mut NodeStates<CascadeNode>,
        step: Step,
        _draws: &mut impl DrawSource,
    ) -> Result<StepReport<CascadeCounts>, SimError> {
        let changed = self.advance(graph, states, step)?;
        Ok(StepReport {
            changed,
            counts: self.counts(states),
        })
    }

    fn counts(&self, states: &NodeStates<CascadeNode>) -> CascadeCounts {
        let active = states.iter().filter(|n| n.is_active()).count() as u64;
        CascadeCounts {
            active,
            inactive: states.len() as u64 - active,
        }
    }

    fn is_terminated(&self, report: &StepReport<CascadeCounts>) -> Option<StopReason> {
        (!report.changed).then_some(StopReason::FixedPoint)
    }

    /// A monotone cascade settles within `n` rounds, plus one to observe it.
    fn default_step_limit(&self, graph: &Graph) -> Step {
        graph.num_nodes() + 1
    }
}
