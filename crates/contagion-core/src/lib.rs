pub mod graph;
pub mod state;
pub mod draws;
pub mod engine;
pub mod trace;
pub mod error;

// Core types
pub type NodeId = usize;
pub type Step = usize;

pub use graph::{Graph, Edge};
pub use state::{NodeStates, CascadeNode, Compartment, EpidemicNode};
pub use draws::{DrawSource, SeededDraws};

// Engine contract
pub use engine::{Engine, StepReport};

// Trace and ensemble types
pub use trace::{Trace, Ensemble, StopReason, CountColumns};

pub use error::{GraphError, ConfigError, SimError};
