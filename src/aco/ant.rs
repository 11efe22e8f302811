//! One sampled candidate: a concrete path plus its evaluated cost.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::Metric;
use crate::evaluator::Evaluator;
use crate::model::{PathNode, describe_path};
use crate::storage::Persistence;
use crate::{Error, Result};

/// A path plus the scores it earned.
///
/// `path_hash` is the lowercase hex SHA-256 of `path_description` and keys
/// the artifact cache. SHA3 digests of the same text are different keys, so
/// artifacts cached by a SHA3-keyed store are never found here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ant {
    pub path: Vec<PathNode>,
    pub metric: Metric,
    pub loss: f64,
    pub accuracy: f64,
    pub path_description: Option<String>,
    pub path_hash: Option<String>,
}

impl Ant {
    /// Unevaluated ant: infinite loss, zero accuracy.
    pub fn new(path: Vec<PathNode>, metric: Metric) -> Self {
        Self {
            path,
            metric,
            loss: Metric::Loss.worst(),
            accuracy: Metric::Accuracy.worst(),
            path_description: None,
            path_hash: None,
        }
    }

    /// The one value comparisons use.
    pub fn cost(&self) -> f64 {
        match self.metric {
            Metric::Loss => self.loss,
            Metric::Accuracy => self.accuracy,
        }
    }

    /// `Type(attr:value, ...) -> Type(...)`
    pub fn describe_path(&self) -> String {
        describe_path(&self.path)
    }

    /// Strictly better than `other` under this ant's metric.
    pub fn is_better_than(&self, other: &Ant) -> bool {
        self.metric.is_better(self.cost(), other.cost())
    }

    /// Describe, hash, build or reuse an artifact, refine, score, cache.
    ///
    /// Any evaluator error or a non-finite score fails the ant; its loss and
    /// accuracy are left untouched. Cache lookups and saves that fail are
    /// logged and skipped.
    pub async fn evaluate<E, P>(&mut self, evaluator: &E, storage: &P, reuse_artifacts: bool) -> Result<()>
    where
        E: Evaluator + ?Sized,
        P: Persistence<E::Artifact> + ?Sized,
    {
        let description = self.describe_path();
        let hash = hex::encode(Sha256::digest(description.as_bytes()));
        self.path_description = Some(description);
        self.path_hash = Some(hash.clone());

        let cached = if reuse_artifacts {
            match storage.load_artifact(&hash).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(hash = %hash, error = %e, "artifact lookup failed, building fresh");
                    None
                }
            }
        } else {
            None
        };
        let artifact = match cached {
            Some(artifact) => {
                debug!(hash = %hash, "reusing cached artifact");
                artifact
            }
            None => evaluator.generate_artifact(&self.path).await?,
        };

        let (artifact, history) = evaluator.refine(artifact).await?;
        let score = evaluator.score(&artifact).await?;
        if !score.is_finite() {
            return Err(Error::Evaluation(format!(
                "non-finite score (loss={}, accuracy={}) for {hash}",
                score.loss, score.accuracy
            )));
        }
        self.loss = score.loss;
        self.accuracy = score.accuracy;
        debug!(hash = %hash, epochs = history.len(), loss = self.loss, accuracy = self.accuracy, "ant evaluated");

        if let Err(e) = storage.save_artifact(&artifact, &hash, self.cost()).await {
            warn!(hash = %hash, error = %e, "artifact save failed");
        }
        Ok(())
    }
}

/// Orders by cost alone. "Less" is a lower number, not a worse ant; rank
/// with [`Metric::is_better`].
impl PartialOrd for Ant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.cost().partial_cmp(&other.cost())
    }
}

impl fmt::Display for Ant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss={:.6} accuracy={:.6} path={} hash={}",
            self.loss,
            self.accuracy,
            self.path_description.as_deref().unwrap_or("<unevaluated>"),
            self.path_hash.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use smallvec::smallvec;

    use crate::evaluator::{Score, TrainingHistory};
    use crate::model::{AttrValue, BoundAttribute, NodeKind};
    use crate::storage::MemoryStorage;

    struct Fixed(Score);

    #[async_trait]
    impl Evaluator for Fixed {
        type Artifact = u32;

        async fn generate_artifact(&self, _path: &[PathNode]) -> Result<u32> {
            Ok(0)
        }

        async fn refine(&self, artifact: u32) -> Result<(u32, TrainingHistory)> {
            Ok((artifact + 1, TrainingHistory::default()))
        }

        async fn score(&self, _artifact: &u32) -> Result<Score> {
            Ok(self.0)
        }
    }

    fn path() -> Vec<PathNode> {
        vec![
            PathNode { name: "Input".into(), kind: NodeKind::Input, attributes: smallvec![] },
            PathNode {
                name: "Dense".into(),
                kind: NodeKind::Flat,
                attributes: smallvec![BoundAttribute {
                    name: "units".into(),
                    value: AttrValue::Int(64),
                    index: 1,
                }],
            },
        ]
    }

    #[test]
    fn test_unevaluated_ant_has_worst_cost() {
        for metric in [Metric::Loss, Metric::Accuracy] {
            let ant = Ant::new(path(), metric);
            assert_eq!(ant.cost(), metric.worst());
            let mut scored = Ant::new(path(), metric);
            scored.loss = 0.5;
            scored.accuracy = 0.5;
            assert!(scored.is_better_than(&ant));
        }
    }

    #[test]
    fn test_cost_follows_metric() {
        let mut ant = Ant::new(path(), Metric::Loss);
        ant.loss = 0.4;
        ant.accuracy = 0.8;
        assert_eq!(ant.cost(), 0.4);
        ant.metric = Metric::Accuracy;
        assert_eq!(ant.cost(), 0.8);
    }

    #[test]
    fn test_ordering_and_ranking() {
        let mut a = Ant::new(path(), Metric::Accuracy);
        let mut b = Ant::new(path(), Metric::Accuracy);
        a.accuracy = 0.9;
        b.accuracy = 0.7;
        assert!(b < a);
        assert!(a.is_better_than(&b));

        a.metric = Metric::Loss;
        b.metric = Metric::Loss;
        a.loss = 0.9;
        b.loss = 0.7;
        assert!(b.is_better_than(&a));
    }

    #[tokio::test]
    async fn test_evaluate_hashes_description() {
        let storage = MemoryStorage::<u32>::new();
        let mut ant = Ant::new(path(), Metric::Loss);
        ant.evaluate(&Fixed(Score::new(0.25, 0.9)), &storage, true).await.unwrap();

        assert_eq!(ant.path_description.as_deref(), Some("Input() -> Dense(units:64)"));
        let hash = ant.path_hash.clone().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(ant.loss, 0.25);
        assert_eq!(storage.cached_cost(&hash), Some(0.25));
        assert!(ant.to_string().contains("Dense(units:64)"));
    }

    #[tokio::test]
    async fn test_evaluate_reuses_cached_artifact() {
        let storage = MemoryStorage::<u32>::new();
        let evaluator = Fixed(Score::new(0.5, 0.5));
        let mut first = Ant::new(path(), Metric::Loss);
        first.evaluate(&evaluator, &storage, true).await.unwrap();
        let hash = first.path_hash.clone().unwrap();
        assert_eq!(storage.load_artifact(&hash).await.unwrap(), Some(1));

        let mut second = Ant::new(path(), Metric::Loss);
        second.evaluate(&evaluator, &storage, true).await.unwrap();
        // refined twice: the cached artifact was the starting point
        assert_eq!(storage.load_artifact(&hash).await.unwrap(), Some(2));

        let mut third = Ant::new(path(), Metric::Loss);
        third.evaluate(&evaluator, &storage, false).await.unwrap();
        assert_eq!(storage.load_artifact(&hash).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_non_finite_score_fails_ant() {
        let storage = MemoryStorage::<u32>::new();
        let mut ant = Ant::new(path(), Metric::Loss);
        let err = ant
            .evaluate(&Fixed(Score::new(f64::NAN, 0.1)), &storage, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
        assert_eq!(ant.loss, f64::INFINITY);
        assert_eq!(storage.artifact_count(), 0);
    }
}
