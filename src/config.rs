//! Search configuration.
//!
//! Values, not flags: everything the engine reads at runtime lives in
//! [`SearchConfig`]. Out-of-domain values are rejected once, at startup,
//! by [`SearchConfig::validate`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which evaluation metric drives ant comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Lower is better.
    #[default]
    Loss,
    /// Higher is better.
    Accuracy,
}

impl Metric {
    /// Strict "a is better than b" under this metric.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Metric::Loss => a < b,
            Metric::Accuracy => a > b,
        }
    }

    /// Cost an ant has before (or without) evaluation.
    pub fn worst(self) -> f64 {
        match self {
            Metric::Loss => f64::INFINITY,
            Metric::Accuracy => 0.0,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Loss => write!(f, "loss"),
            Metric::Accuracy => write!(f, "accuracy"),
        }
    }
}

/// Shape of the candidate each ant produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathShape {
    /// One walk from the input node, closed into the output node.
    #[default]
    Single,
    /// Encoder walk followed by a decoder walk seeded from the latent size.
    Autoencoder,
}

/// Pheromone model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PheromoneConfig {
    /// Initial weight of every edge and attribute value; also the local-update target.
    pub start: f64,
    /// Local update factor.
    pub decay: f64,
    /// Global update factor.
    pub evaporation: f64,
    /// Log the full pheromone report after every iteration.
    pub verbose: bool,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self { start: 0.1, decay: 0.1, evaporation: 0.1, verbose: false }
    }
}

/// Configuration for one ACO search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub metric: Metric,
    /// Search stops once the graph depth exceeds this.
    pub max_depth: usize,
    /// Depth the graph starts at.
    pub min_depth: usize,
    /// Ants per iteration.
    pub ant_count: usize,
    /// Probability of greedy (max-weight) selection at each choice.
    pub greediness: f64,
    pub pheromone: PheromoneConfig,
    /// Seed for the search RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub shape: PathShape,
    /// Reuse a cached artifact when a path hash was seen before.
    pub reuse_artifacts: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Loss,
            max_depth: 5,
            min_depth: 0,
            ant_count: 4,
            greediness: 0.5,
            pheromone: PheromoneConfig::default(),
            seed: None,
            shape: PathShape::Single,
            reuse_artifacts: true,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_depth(mut self, min_depth: usize, max_depth: usize) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    pub fn with_ant_count(mut self, n: usize) -> Self {
        self.ant_count = n;
        self
    }

    pub fn with_greediness(mut self, greediness: f64) -> Self {
        self.greediness = greediness;
        self
    }

    pub fn with_pheromone(mut self, pheromone: PheromoneConfig) -> Self {
        self.pheromone = pheromone;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_shape(mut self, shape: PathShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_artifact_reuse(mut self, reuse: bool) -> Self {
        self.reuse_artifacts = reuse;
        self
    }

    /// Reject values outside their documented domains.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.greediness) {
            return Err(invalid("greediness", self.greediness, "must be within [0, 1]"));
        }
        let p = &self.pheromone;
        if !(p.start.is_finite() && p.start > 0.0) {
            return Err(invalid("pheromone.start", p.start, "must be positive and finite"));
        }
        if !(p.decay > 0.0 && p.decay < 1.0) {
            return Err(invalid("pheromone.decay", p.decay, "must be within (0, 1)"));
        }
        if !(p.evaporation > 0.0 && p.evaporation < 1.0) {
            return Err(invalid("pheromone.evaporation", p.evaporation, "must be within (0, 1)"));
        }
        if self.ant_count == 0 {
            return Err(invalid("ant_count", 0, "must be at least 1"));
        }
        if self.min_depth > self.max_depth {
            return Err(Error::Config(format!(
                "min_depth ({}) exceeds max_depth ({})",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl std::fmt::Display, reason: &str) -> Error {
    Error::Config(format!("{name} = {value}: {reason}"))
}
