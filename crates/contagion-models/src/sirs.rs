use contagion_core::engine::check_store_size;
use contagion_core::{
    Compartment, ConfigError, CountColumns, DrawSource, Engine, EpidemicNode, Graph, NodeId,
    NodeStates, SimError, Step, StepReport, StopReason,
};
use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use tracing::debug;

/// SIRS parameters. Durations are measured in steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SirsParams {
    /// Per-edge transmission probability for one step of contact
    pub probability_of_infection: f64,
    /// Maximum number of steps to simulate
    pub lifespan: usize,
    /// Fraction of all nodes sheltering in place
    pub shelter: f64,
    /// Fraction of non-initiator nodes vaccinated
    pub vaccinations: f64,
    /// Steps an infected node stays infectious before recovering
    #[serde(default = "default_infectious_duration")]
    pub infectious_duration: usize,
    /// Steps of immunity before a recovered node is susceptible again;
    /// `None` keeps recovered nodes immune for the rest of the run
    #[serde(default)]
    pub immunity_duration: Option<usize>,
    /// Share of transmission removed on edges touching a sheltering node;
    /// `1.0` excludes those edges entirely
    #[serde(default = "default_shelter_efficacy")]
    pub shelter_efficacy: f64,
}

fn default_infectious_duration() -> usize {
    1
}

fn default_shelter_efficacy() -> f64 {
    1.0
}

impl SirsParams {
    pub fn new(probability_of_infection: f64, lifespan: usize, shelter: f64, vaccinations: f64) -> Self {
        Self {
            probability_of_infection,
            lifespan,
            shelter,
            vaccinations,
            infectious_duration: default_infectious_duration(),
            immunity_duration: None,
            shelter_efficacy: default_shelter_efficacy(),
        }
    }

    pub fn with_infectious_duration(mut self, steps: usize) -> Self {
        self.infectious_duration = steps;
        self
    }

    pub fn with_immunity_duration(mut self, steps: usize) -> Self {
        self.immunity_duration = Some(steps);
        self
    }

    pub fn with_shelter_efficacy(mut self, efficacy: f64) -> Self {
        self.shelter_efficacy = efficacy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::check_fraction("probability_of_infection", self.probability_of_infection)?;
        crate::check_fraction("shelter", self.shelter)?;
        crate::check_fraction("vaccinations", self.vaccinations)?;
        crate::check_fraction("shelter_efficacy", self.shelter_efficacy)?;

        check_duration("lifespan", self.lifespan)?;
        check_duration("infectious_duration", self.infectious_duration)?;
        if let Some(immunity) = self.immunity_duration {
            check_duration("immunity_duration", immunity)?;
        }
        Ok(())
    }
}

fn check_duration(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidDuration { name, value });
    }
    Ok(())
}

/// Vaccinated nodes are counted on their own, never as recovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SirsCounts {
    pub susceptible: u64,
    pub infected: u64,
    pub recovered: u64,
    pub vaccinated: u64,
}

impl CountColumns for SirsCounts {
    fn column_names() -> &'static [&'static str] {
        &["susceptible", "infected", "recovered", "vaccinated"]
    }

    fn values(&self) -> Vec<u64> {
        vec![self.susceptible, self.infected, self.recovered, self.vaccinated]
    }
}

/// Discrete-time SIRS process with shelter-in-place and vaccination
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SirsEpidemic {
    pub params: SirsParams,
}

impl SirsEpidemic {
    pub fn new(params: SirsParams) -> Self {
        Self { params }
    }

    /// Per-edge transmission probability from `source` to `target`
    fn edge_probability(&self, source: &EpidemicNode, target: &EpidemicNode) -> f64 {
        let p = self.params.probability_of_infection;
        if source.sheltering || target.sheltering {
            p * (1.0 - self.params.shelter_efficacy)
        } else {
            p
        }
    }

    /// Probability that `v` is infected this step, and whether any
    /// in-neighbour is infected at all.
    ///
    /// P = 1 - Π_u (1 - p_uv) over infected in-neighbours u; without
    /// sheltering this is 1 - (1 - p)^k.
    pub fn infection_probability(
        &self,
        graph: &Graph,
        states: &NodeStates<EpidemicNode>,
        v: NodeId,
    ) -> (f64, bool) {
        let target = &states[v];
        let mut escape = 1.0;
        let mut exposed = false;

        for &u in graph.predecessors(v) {
            let source = &states[u];
            if source.is_infected() {
                exposed = true;
                escape *= 1.0 - self.edge_probability(source, target);
            }
        }

        (1.0 - escape, exposed)
    }

    /// One synchronous step; returns the counts after it.
    pub fn advance(
        &self,
        graph: &Graph,
        states: &mut NodeStates<EpidemicNode>,
        step: Step,
        draws: &mut impl DrawSource,
    ) -> Result<SirsCounts, SimError> {
        Ok(self.transition(graph, states, step, draws)?.counts)
    }

    fn transition(
        &self,
        graph: &Graph,
        states: &mut NodeStates<EpidemicNode>,
        step: Step,
        draws: &mut impl DrawSource,
    ) -> Result<StepReport<SirsCounts>, SimError> {
        check_store_size(graph, states, step)?;

        let mut transitions: Vec<(NodeId, Compartment)> = Vec::new();

        for v in graph.node_ids() {
            let node = &states[v];
            if node.vaccinated {
                if node.is_infected() {
                    return Err(SimError::node(step, v, "vaccinated node is infected"));
                }
                continue;
            }

            match node.compartment {
                Compartment::Susceptible => {
                    let (probability, exposed) = self.infection_probability(graph, states, v);
                    if exposed && draws.uniform() < probability {
                        transitions.push((v, Compartment::Infected));
                    }
                }
                Compartment::Infected => {
                    if node.dwell(step) >= self.params.infectious_duration {
                        transitions.push((v, Compartment::Recovered));
                    }
                }
                Compartment::Recovered => {
                    if let Some(immunity) = self.params.immunity_duration {
                        if node.dwell(step) >= immunity {
                            transitions.push((v, Compartment::Susceptible));
                        }
                    }
                }
            }
        }

        for &(v, compartment) in &transitions {
            states[v].enter(compartment, step);
        }

        Ok(StepReport {
            changed: !transitions.is_empty(),
            counts: self.counts(states),
        })
    }
}

impl Engine for SirsEpidemic {
    type Node = EpidemicNode;
    type Counts = SirsCounts;

    /// Vaccination is drawn first, from non-initiators only; shelter is
    /// drawn next from every node; initiators are infected last.
    fn initialize(
        &self,
        graph: &Graph,
        initiators: &[NodeId],
        draws: &mut impl DrawSource,
    ) -> Result<NodeStates<EpidemicNode>, SimError> {
        let n = graph.num_nodes();
        let mut states = NodeStates::filled(n, EpidemicNode::default());

        let seeded: HashSet<NodeId> = initiators.iter().copied().collect();
        if let Some(&id) = seeded.iter().find(|&&id| id >= n) {
            return Err(SimError::node(0, id, "initiator outside the graph"));
        }

        let eligible: Vec<NodeId> = graph.node_ids().filter(|v| !seeded.contains(v)).collect();
        let n_vaccinated = fraction_of(self.params.vaccinations, eligible.len());
        for i in draws.sample_indices(eligible.len(), n_vaccinated) {
            let node = &mut states[eligible[i]];
            node.vaccinated = true;
            node.enter(Compartment::Recovered, 0);
        }

        let n_sheltering = fraction_of(self.params.shelter, n);
        for v in draws.sample_indices(n, n_sheltering) {
            states[v].sheltering = true;
        }

        for &id in &seeded {
            states[id].enter(Compartment::Infected, 0);
        }

        debug!(
            nodes = n,
            vaccinated = n_vaccinated,
            sheltering = n_sheltering,
            initiators = seeded.len(),
            "assigned interventions"
        );

        Ok(states)
    }

    fn step(
        &self,
        graph: &Graph,
        states: &mut NodeStates<EpidemicNode>,
        step: Step,
        draws: &mut impl DrawSource,
    ) -> Result<StepReport<SirsCounts>, SimError> {
        self.transition(graph, states, step, draws)
    }

    fn counts(&self, states: &NodeStates<EpidemicNode>) -> SirsCounts {
        let mut counts = SirsCounts::default();
        for node in states.iter() {
            if node.vaccinated {
                counts.vaccinated += 1;
                continue;
            }
            match node.compartment {
                Compartment::Susceptible => counts.susceptible += 1,
                Compartment::Infected => counts.infected += 1,
                Compartment::Recovered => counts.recovered += 1,
            }
        }
        counts
    }

    fn is_terminated(&self, report: &StepReport<SirsCounts>) -> Option<StopReason> {
        (report.counts.infected == 0).then_some(StopReason::Extinct)
    }

    fn default_step_limit(&self, _graph: &Graph) -> Step {
        self.params.lifespan
    }
}

/// `floor(fraction * count)`, truncating toward zero
fn fraction_of(fraction: f64, count: usize) -> usize {
    ((fraction * count as f64).floor() as usize).min(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contagion_core::SeededDraws;

    fn infected_node() -> EpidemicNode {
        EpidemicNode {
            compartment: Compartment::Infected,
            ..EpidemicNode::default()
        }
    }

    #[test]
    fn test_fraction_of() {
        assert_eq!(fraction_of(0.0, 10), 0);
        assert_eq!(fraction_of(0.25, 10), 2);
        assert_eq!(fraction_of(1.0, 10), 10);
    }

    #[test]
    fn test_validate_params() {
        assert!(SirsParams::new(0.3, 10, 0.1, 0.2).validate().is_ok());
        assert_eq!(
            SirsParams::new(1.2, 10, 0.0, 0.0).validate(),
            Err(ConfigError::OutOfRange { name: "probability_of_infection", value: 1.2 })
        );
        assert_eq!(
            SirsParams::new(0.5, 10, -0.1, 0.0).validate(),
            Err(ConfigError::OutOfRange { name: "shelter", value: -0.1 })
        );
        assert_eq!(
            SirsParams::new(0.5, 10, 0.0, 2.0).validate(),
            Err(ConfigError::OutOfRange { name: "vaccinations", value: 2.0 })
        );
        assert_eq!(
            SirsParams::new(0.5, 0, 0.0, 0.0).validate(),
            Err(ConfigError::InvalidDuration { name: "lifespan", value: 0 })
        );
        assert_eq!(
            SirsParams::new(0.5, 5, 0.0, 0.0).with_immunity_duration(0).validate(),
            Err(ConfigError::InvalidDuration { name: "immunity_duration", value: 0 })
        );
    }

    #[test]
    fn test_probability_matches_closed_form() {
        // Three infected sources feeding node 3
        let g = Graph::from_labeled_edges(
            &["0", "1", "2", "3"],
            &[("0", "3"), ("1", "3"), ("2", "3")],
        )
        .unwrap();
        let model = SirsEpidemic::new(SirsParams::new(0.2, 10, 0.0, 0.0));
        let mut states = NodeStates::filled(4, EpidemicNode::default());
        for v in 0..3 {
            states[v] = infected_node();
        }

        let (p, exposed) = model.infection_probability(&g, &states, 3);
        assert!(exposed);
        assert_relative_eq!(p, 1.0 - 0.8f64.powi(3), epsilon = 1e-12);
    }

    #[test]
    fn test_shelter_discount() {
        let g = Graph::from_labeled_edges(&["0", "1"], &[("0", "1")]).unwrap();
        let mut states = NodeStates::filled(2, EpidemicNode::default());
        states[0] = infected_node();
        states[0].sheltering = true;

        let excluded = SirsEpidemic::new(SirsParams::new(0.8, 10, 0.0, 0.0));
        let (p, exposed) = excluded.infection_probability(&g, &states, 1);
        assert!(exposed);
        assert_eq!(p, 0.0);

        let halved = SirsEpidemic::new(SirsParams::new(0.8, 10, 0.0, 0.0).with_shelter_efficacy(0.5));
        let (p, _) = halved.infection_probability(&g, &states, 1);
        assert_relative_eq!(p, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_initialize_assigns_interventions() {
        let g = Graph::ring_lattice(20, 2).unwrap();
        let model = SirsEpidemic::new(SirsParams::new(0.5, 10, 0.25, 0.5));
        let mut draws = SeededDraws::new(11);
        let states = model.initialize(&g, &[0, 1], &mut draws).unwrap();

        let counts = model.counts(&states);
        assert_eq!(counts.infected, 2);
        assert_eq!(counts.vaccinated, 9); // floor(0.5 * 18)
        assert_eq!(counts.susceptible, 9);
        assert_eq!(states.iter().filter(|n| n.sheltering).count(), 5);
        assert!(!states[0].vaccinated && !states[1].vaccinated);
    }

    #[test]
    fn test_rejects_infected_vaccinated_node() {
        let g = Graph::cycle(3).unwrap();
        let model = SirsEpidemic::new(SirsParams::new(0.5, 10, 0.0, 0.0));
        let mut states = NodeStates::filled(3, EpidemicNode::default());
        states[2] = infected_node();
        states[2].vaccinated = true;

        let result = model.advance(&g, &mut states, 1, &mut SeededDraws::new(0));
        assert!(matches!(result, Err(SimError::Invariant { step: 1, .. })));
    }
}
