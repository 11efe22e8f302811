//! Pheromone update rules.
//!
//! Both rules are pure functions of `(old value, ant cost)`, applied through
//! one primitive ([`UpdateRule::apply`]) to edges and attribute values alike.
//!
//! ```text
//! local:  new = (1 − decay)·old + decay·start
//! global: new = (1 − evaporation)·old + evaporation·reinforcement(cost)
//!         reinforcement = 1 / (cost·10)   (loss)
//!                       = cost            (accuracy)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Metric, PheromoneConfig};

/// Lower bound for every pheromone value, so no edge or value can reach a
/// zero selection probability.
pub const PHEROMONE_FLOOR: f64 = 1e-9;

/// Which update is being applied, with the parameters it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRule {
    /// Per-ant decay toward the starting value. Ignores cost.
    Local { decay: f64, start: f64 },
    /// Once-per-iteration evaporation and reinforcement along the best path.
    Global { evaporation: f64, metric: Metric },
}

impl UpdateRule {
    pub fn local(config: &PheromoneConfig) -> Self {
        UpdateRule::Local { decay: config.decay, start: config.start }
    }

    pub fn global(config: &PheromoneConfig, metric: Metric) -> Self {
        UpdateRule::Global { evaporation: config.evaporation, metric }
    }

    /// New pheromone value for an edge or attribute value.
    pub fn apply(&self, old: f64, cost: f64) -> f64 {
        let new = match *self {
            UpdateRule::Local { decay, start } => (1.0 - decay) * old + decay * start,
            UpdateRule::Global { evaporation, metric } => {
                (1.0 - evaporation) * old + evaporation * reinforcement(metric, cost)
            }
        };
        if new.is_finite() { new.max(PHEROMONE_FLOOR) } else { old }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateRule::Local { .. } => "local",
            UpdateRule::Global { .. } => "global",
        }
    }
}

/// Pheromone deposited by a solution of the given cost.
pub fn reinforcement(metric: Metric, cost: f64) -> f64 {
    match metric {
        Metric::Loss => 1.0 / (cost * 10.0),
        Metric::Accuracy => cost,
    }
}
