use contagion_core::{ConfigError, Engine, Graph, NodeId, Step};
use contagion_models::{SirsParams, ThresholdCascade};
use serde::{Serialize, Deserialize};
use std::str::FromStr;

/// Which propagation model a run drives
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Cascade,
    Covid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Cascade => "cascade",
            Action::Covid => "covid",
        }
    }
}

impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cascade" => Ok(Action::Cascade),
            "covid" => Ok(Action::Covid),
            other => Err(ConfigError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ModelConfig {
    Cascade { threshold: f64 },
    Covid(SirsParams),
}

/// Optional SIRS policy knobs; unset fields keep the model defaults
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SirsPolicy {
    pub infectious_duration: Option<usize>,
    pub immunity_duration: Option<usize>,
    pub shelter_efficacy: Option<f64>,
}

/// Loose model parameters as collected from a command line
#[derive(Clone, Debug, Default)]
pub struct ModelArgs {
    pub threshold: Option<f64>,
    pub probability_of_infection: Option<f64>,
    pub lifespan: Option<usize>,
    pub shelter: Option<f64>,
    pub vaccinations: Option<f64>,
    pub policy: SirsPolicy,
}

impl ModelConfig {
    /// Assemble the configuration for `action`, requiring its parameters.
    pub fn from_args(action: Action, args: &ModelArgs) -> Result<Self, ConfigError> {
        match action {
            Action::Cascade => {
                let threshold = args.threshold.ok_or(ConfigError::MissingParameter("threshold"))?;
                Ok(ModelConfig::Cascade { threshold })
            }
            Action::Covid => {
                let mut params = SirsParams::new(
                    args.probability_of_infection
                        .ok_or(ConfigError::MissingParameter("probability_of_infection"))?,
                    args.lifespan.ok_or(ConfigError::MissingParameter("lifespan"))?,
                    args.shelter.ok_or(ConfigError::MissingParameter("shelter"))?,
                    args.vaccinations.ok_or(ConfigError::MissingParameter("vaccinations"))?,
                );
                if let Some(steps) = args.policy.infectious_duration {
                    params.infectious_duration = steps;
                }
                params.immunity_duration = args.policy.immunity_duration;
                if let Some(efficacy) = args.policy.shelter_efficacy {
                    params.shelter_efficacy = efficacy;
                }
                Ok(ModelConfig::Covid(params))
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ModelConfig::Cascade { .. } => Action::Cascade,
            ModelConfig::Covid(_) => Action::Covid,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ModelConfig::Cascade { threshold } => ThresholdCascade::new(*threshold).validate(),
            ModelConfig::Covid(params) => params.validate(),
        }
    }
}

/// Everything fixed before the first step of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Node labels seeded active / infected at step 0
    pub initiators: Vec<String>,
    pub model: ModelConfig,
    /// Overrides the cascade step limit; an epidemic never runs past its lifespan
    #[serde(default)]
    pub max_steps: Option<Step>,
    /// `None` draws fresh entropy for every run
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(initiators: Vec<String>, model: ModelConfig) -> Self {
        Self { initiators, model, max_steps: None, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_steps(mut self, max_steps: Step) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Parse a comma-separated initiator list such as `"a, b,c"`.
    pub fn parse_initiators(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check parameters and resolve initiator labels against `graph`.
    /// Repeated initiators are kept once.
    pub fn validate(&self, graph: &Graph) -> Result<Vec<NodeId>, ConfigError> {
        self.model.validate()?;

        if self.initiators.is_empty() {
            return Err(ConfigError::NoInitiators);
        }

        let mut ids = Vec::with_capacity(self.initiators.len());
        for label in &self.initiators {
            let id = graph
                .node_id(label)
                .ok_or_else(|| ConfigError::UnknownInitiator(label.clone()))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn step_limit(&self, engine: &impl Engine, graph: &Graph) -> Step {
        let default = engine.default_step_limit(graph);
        match (&self.model, self.max_steps) {
            (ModelConfig::Covid(_), Some(max)) => max.min(default),
            (_, Some(max)) => max,
            (_, None) => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        Graph::from_labeled_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]).unwrap()
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("cascade".parse::<Action>(), Ok(Action::Cascade));
        assert_eq!(" COVID ".parse::<Action>(), Ok(Action::Covid));
        assert_eq!(
            "flu".parse::<Action>(),
            Err(ConfigError::UnknownAction("flu".into()))
        );
    }

    #[test]
    fn test_missing_parameters() {
        let args = ModelArgs::default();
        assert_eq!(
            ModelConfig::from_args(Action::Cascade, &args),
            Err(ConfigError::MissingParameter("threshold"))
        );

        let args = ModelArgs {
            probability_of_infection: Some(0.2),
            lifespan: Some(10),
            shelter: Some(0.0),
            ..ModelArgs::default()
        };
        assert_eq!(
            ModelConfig::from_args(Action::Covid, &args),
            Err(ConfigError::MissingParameter("vaccinations"))
        );
    }

    #[test]
    fn test_policy_overrides_defaults() {
        let args = ModelArgs {
            probability_of_infection: Some(0.2),
            lifespan: Some(10),
            shelter: Some(0.1),
            vaccinations: Some(0.1),
            policy: SirsPolicy {
                infectious_duration: Some(4),
                immunity_duration: Some(7),
                shelter_efficacy: None,
            },
            ..ModelArgs::default()
        };
        match ModelConfig::from_args(Action::Covid, &args).unwrap() {
            ModelConfig::Covid(params) => {
                assert_eq!(params.infectious_duration, 4);
                assert_eq!(params.immunity_duration, Some(7));
                assert_eq!(params.shelter_efficacy, 1.0);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_initiators_resolved_and_deduplicated() {
        let config = RunConfig::new(
            RunConfig::parse_initiators("c, a,c,"),
            ModelConfig::Cascade { threshold: 0.5 },
        );
        assert_eq!(config.validate(&triangle()), Ok(vec![2, 0]));
    }

    #[test]
    fn test_unknown_initiator() {
        let config = RunConfig::new(vec!["z".into()], ModelConfig::Cascade { threshold: 0.5 });
        assert_eq!(
            config.validate(&triangle()),
            Err(ConfigError::UnknownInitiator("z".into()))
        );
    }

    #[test]
    fn test_empty_initiators() {
        let config = RunConfig::new(RunConfig::parse_initiators(" , "), ModelConfig::Cascade { threshold: 0.5 });
        assert_eq!(config.validate(&triangle()), Err(ConfigError::NoInitiators));
    }

    #[test]
    fn test_out_of_range_reported_before_initiators() {
        let config = RunConfig::new(vec!["z".into()], ModelConfig::Cascade { threshold: -0.1 });
        assert_eq!(
            config.validate(&triangle()),
            Err(ConfigError::OutOfRange { name: "threshold", value: -0.1 })
        );
    }

    #[test]
    fn test_epidemic_step_limit_capped_by_lifespan() {
        let graph = triangle();
        let params = SirsParams::new(0.5, 3, 0.0, 0.0);
        let engine = contagion_models::SirsEpidemic::new(params.clone());

        let config = RunConfig::new(vec!["a".into()], ModelConfig::Covid(params.clone()));
        assert_eq!(config.step_limit(&engine, &graph), 3);
        assert_eq!(config.clone().with_max_steps(10).step_limit(&engine, &graph), 3);
        assert_eq!(config.with_max_steps(2).step_limit(&engine, &graph), 2);
    }

    #[test]
    fn test_cascade_step_limit_override() {
        let graph = triangle();
        let engine = ThresholdCascade::new(0.5);
        let config = RunConfig::new(vec!["a".into()], ModelConfig::Cascade { threshold: 0.5 });
        assert_eq!(config.step_limit(&engine, &graph), 4);
        assert_eq!(config.with_max_steps(10).step_limit(&engine, &graph), 10);
    }

    #[test]
    fn test_config_json_shape() {
        let json = r#"{
            "initiators": ["a"],
            "model": { "action": "covid", "probability_of_infection": 0.3,
                       "lifespan": 20, "shelter": 0.1, "vaccinations": 0.2 },
            "seed": 7
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model.action(), Action::Covid);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_steps, None);
        assert!(config.validate(&triangle()).is_ok());
    }
}
