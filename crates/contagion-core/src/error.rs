use crate::{NodeId, Step};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate node label '{0}'")]
    DuplicateLabel(String),

    #[error("duplicate edge {0} -> {1}")]
    DuplicateEdge(String, String),

    #[error("self-loop on node '{0}'")]
    SelfLoop(String),

    #[error("edge endpoint '{0}' is not a node of the graph")]
    UnknownEndpoint(String),
}

/// Rejected before the first step executes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initiator '{0}' does not exist in the graph")]
    UnknownInitiator(String),

    #[error("at least one initiator is required")]
    NoInitiators,

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("--{0} is required for this action")]
    MissingParameter(&'static str),

    #[error("{name} must be at least 1, got {value}")]
    InvalidDuration { name: &'static str, value: usize },

    #[error("--{name} must be at least 1, got {value}")]
    InvalidCount { name: &'static str, value: usize },

    #[error("unknown action '{0}' (expected 'cascade' or 'covid')")]
    UnknownAction(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violated at step {step}: {detail}")]
    Invariant { step: Step, detail: String },
}

impl SimError {
    pub fn invariant(step: Step, detail: impl Into<String>) -> Self {
        SimError::Invariant { step, detail: detail.into() }
    }

    pub fn state_size(step: Step, expected: usize, found: usize) -> Self {
        Self::invariant(
            step,
            format!("state store holds {found} nodes but the graph has {expected}"),
        )
    }

    pub fn node(step: Step, node: NodeId, detail: &str) -> Self {
        Self::invariant(step, format!("node {node}: {detail}"))
    }
}
