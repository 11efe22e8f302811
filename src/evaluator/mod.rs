//! # Evaluator Contract
//!
//! The engine never builds or trains a candidate. An [`Evaluator`] turns a
//! path into an artifact (a model, a pipeline, anything), refines it, and
//! scores it. Scores need not be deterministic.
//!
//! ```text
//! path ──generate_artifact──▶ artifact ──refine──▶ artifact' ──score──▶ (loss, accuracy)
//!                  ▲
//!   cached artifact (Persistence::load_artifact) replaces this step on a hit
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::PathNode;
use crate::Result;

/// Result of scoring one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub loss: f64,
    pub accuracy: f64,
}

impl Score {
    pub fn new(loss: f64, accuracy: f64) -> Self {
        Self { loss, accuracy }
    }

    pub fn is_finite(&self) -> bool {
        self.loss.is_finite() && self.accuracy.is_finite()
    }
}

/// Per-epoch statistics reported by [`Evaluator::refine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub loss: f64,
    pub accuracy: Option<f64>,
}

/// Training history of one refinement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
}

impl TrainingHistory {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.loss)
    }
}

/// Objective-evaluation backend.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// What the evaluator builds from a path.
    type Artifact: Send + Sync + 'static;

    /// Materialize a fresh artifact from a path.
    async fn generate_artifact(&self, path: &[PathNode]) -> Result<Self::Artifact>;

    /// Train / refine an artifact.
    async fn refine(&self, artifact: Self::Artifact) -> Result<(Self::Artifact, TrainingHistory)>;

    /// Score a refined artifact.
    async fn score(&self, artifact: &Self::Artifact) -> Result<Score>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_finiteness() {
        assert!(Score::new(0.3, 0.9).is_finite());
        assert!(!Score::new(f64::NAN, 0.9).is_finite());
        assert!(!Score::new(0.3, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_history_final_loss() {
        let mut history = TrainingHistory::default();
        assert_eq!(history.final_loss(), None);
        history.epochs.push(EpochStats { loss: 0.8, accuracy: None });
        history.epochs.push(EpochStats { loss: 0.4, accuracy: Some(0.7) });
        assert_eq!(history.final_loss(), Some(0.4));
        assert_eq!(history.len(), 2);
    }
}
