use crate::Step;
use serde::{Serialize, Deserialize};

/// Why a run stopped stepping
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// A step produced no change
    FixedPoint,
    /// No node is left infected
    Extinct,
    /// The configured maximum step count was reached
    StepLimit,
}

/// Aggregate counts that can be laid out as named table columns
pub trait CountColumns {
    fn column_names() -> &'static [&'static str];

    fn values(&self) -> Vec<u64>;

    fn total(&self) -> u64 {
        self.values().iter().sum()
    }
}

/// Per-step aggregate counts of one run, starting at step 0
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace<C> {
    pub steps: Vec<Step>,
    pub counts: Vec<C>,
    pub stop: Option<StopReason>,
}

impl<C> Trace<C> {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            counts: Vec::new(),
            stop: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
            stop: None,
        }
    }

    pub fn push(&mut self, step: Step, counts: C) {
        self.steps.push(step);
        self.counts.push(counts);
    }

    pub fn finish(&mut self, reason: StopReason) {
        self.stop = Some(reason);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn initial_counts(&self) -> Option<&C> {
        self.counts.first()
    }

    pub fn final_counts(&self) -> Option<&C> {
        self.counts.last()
    }

    /// Index of the last recorded step
    pub fn final_step(&self) -> Option<Step> {
        self.steps.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Step, &C)> {
        self.steps.iter().copied().zip(self.counts.iter())
    }
}

impl<C> Default for Trace<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Traces of independent repetitions of the same configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Ensemble<C> {
    pub traces: Vec<Trace<C>>,
}

impl<C> Ensemble<C> {
    pub fn new(traces: Vec<Trace<C>>) -> Self {
        Self { traces }
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
