use crate::{NodeId, Step};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Per-node simulation state, indexed by `NodeId`.
///
/// Owned by exactly one run and threaded through every step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStates<T>(pub Vec<T>);

impl<T> NodeStates<T> {
    pub fn new(values: Vec<T>) -> Self {
        NodeStates(values)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Clone> NodeStates<T> {
    pub fn filled(n: usize, value: T) -> Self {
        NodeStates(vec![value; n])
    }
}

impl<T> std::ops::Deref for NodeStates<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for NodeStates<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for NodeStates<T> {
    fn from(v: Vec<T>) -> Self {
        NodeStates(v)
    }
}

/// Cascade adoption state. Once active, a node stays active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeNode {
    pub activated_at: Option<Step>,
}

impl CascadeNode {
    pub fn initiator() -> Self {
        Self { activated_at: Some(0) }
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

impl fmt::Display for CascadeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.activated_at {
            Some(step) => write!(f, "active (step {})", step),
            None => write!(f, "inactive"),
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compartment::Susceptible => "susceptible",
            Compartment::Infected => "infected",
            Compartment::Recovered => "recovered",
        };
        f.write_str(name)
    }
}

/// SIRS state of one node. `sheltering` and `vaccinated` are assigned
/// once at initialization and never change during the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpidemicNode {
    pub compartment: Compartment,
    /// Step at which the current compartment was entered
    pub since: Step,
    pub sheltering: bool,
    pub vaccinated: bool,
}

impl Default for EpidemicNode {
    fn default() -> Self {
        Self {
            compartment: Compartment::Susceptible,
            since: 0,
            sheltering: false,
            vaccinated: false,
        }
    }
}

impl EpidemicNode {
    pub fn is_infected(&self) -> bool {
        self.compartment == Compartment::Infected
    }

    pub fn enter(&mut self, compartment: Compartment, step: Step) {
        self.compartment = compartment;
        self.since = step;
    }

    /// Steps spent in the current compartment as of `step`
    pub fn dwell(&self, step: Step) -> Step {
        step.saturating_sub(self.since)
    }
}

impl fmt::Display for EpidemicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vaccinated {
            f.write_str("vaccinated")?;
        } else {
            write!(f, "{} (step {})", self.compartment, self.since)?;
        }
        if self.sheltering {
            f.write_str(", sheltering")?;
        }
        Ok(())
    }
}
