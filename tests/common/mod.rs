//! Shared fixtures for the end-to-end tests: catalogs and scripted evaluators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use antgraph::catalog::{DecoderSpec, LatentBinding};
use antgraph::{
    Catalog, CatalogDef, Checkpoint, Error, Evaluator, EpochStats, NodeKind, NodeSpec, PathNode,
    Persistence, Result, Score, StaticCatalog, TrainingHistory,
};

// ============================================================================
// Catalogs
// ============================================================================

/// Image classifier: spatial input, convolutions, flatten, dense head.
pub fn image_catalog() -> Arc<dyn Catalog> {
    let def = CatalogDef {
        input: "Input".into(),
        output: "Output".into(),
        flatten: Some("Flatten".into()),
        spatial_input: true,
        decoder: None,
        nodes: vec![
            NodeSpec::new("Input", NodeKind::Input)
                .with_transition("Conv2D", 1.0)
                .with_transition("Dense", 1.0),
            NodeSpec::new("Conv2D", NodeKind::Spatial)
                .with_attribute("filter_count", [16, 32, 64])
                .with_attribute("kernel_size", [1, 3, 5])
                .with_transition("Conv2D", 1.0)
                .with_transition("Dropout", 1.0)
                .with_transition("Flatten", 1.0),
            NodeSpec::new("Dropout", NodeKind::Spatial)
                .with_attribute("rate", [0.1, 0.3])
                .with_transition("Conv2D", 1.0),
            NodeSpec::new("Flatten", NodeKind::Flat).with_transition("Dense", 1.0),
            NodeSpec::new("Dense", NodeKind::Flat)
                .with_attribute("units", [32, 64, 128])
                .with_transition("Dense", 1.0),
            NodeSpec::new("Output", NodeKind::Output).with_attribute("activation", ["softmax"]),
        ],
    };
    Arc::new(StaticCatalog::new(def).unwrap())
}

/// One legal transition per node type, unit heuristic.
pub fn chain_catalog() -> Arc<dyn Catalog> {
    let def = CatalogDef {
        input: "Input".into(),
        output: "Output".into(),
        flatten: None,
        spatial_input: false,
        decoder: None,
        nodes: vec![
            NodeSpec::new("Input", NodeKind::Input).with_transition("Dense", 1.0),
            NodeSpec::new("Dense", NodeKind::Flat)
                .with_attribute("units", [16, 32, 64])
                .with_attribute("activation", ["relu", "tanh"])
                .with_transition("Dense", 1.0),
            NodeSpec::new("Output", NodeKind::Output),
        ],
    };
    Arc::new(StaticCatalog::new(def).unwrap())
}

/// Two choices out of the input whose heuristics differ by `ratio`.
pub fn fork_catalog(ratio: f64) -> Arc<dyn Catalog> {
    let def = CatalogDef {
        input: "Input".into(),
        output: "Output".into(),
        flatten: None,
        spatial_input: false,
        decoder: None,
        nodes: vec![
            NodeSpec::new("Input", NodeKind::Input)
                .with_transition("Wide", ratio)
                .with_transition("Narrow", 1.0),
            NodeSpec::new("Wide", NodeKind::Flat),
            NodeSpec::new("Narrow", NodeKind::Flat),
            NodeSpec::new("Output", NodeKind::Output),
        ],
    };
    Arc::new(StaticCatalog::new(def).unwrap())
}

/// Encoder over an image input plus a decoder seeded with the latent size.
pub fn autoencoder_catalog() -> Arc<dyn Catalog> {
    let def = CatalogDef {
        input: "Input".into(),
        output: "Output".into(),
        flatten: Some("Flatten".into()),
        spatial_input: true,
        decoder: Some(DecoderSpec {
            input: "DecoderInput".into(),
            output: "DecoderOutput".into(),
            latent: Some(LatentBinding { source: "units".into(), target: "latent_size".into() }),
        }),
        nodes: vec![
            NodeSpec::new("Input", NodeKind::Input)
                .with_transition("Conv2D", 1.0)
                .with_transition("Dense", 1.0),
            NodeSpec::new("Conv2D", NodeKind::Spatial)
                .with_attribute("filter_count", [8, 16])
                .with_transition("Conv2D", 1.0)
                .with_transition("Dense", 1.0),
            NodeSpec::new("Flatten", NodeKind::Flat),
            NodeSpec::new("Dense", NodeKind::Flat)
                .with_attribute("units", [8, 16, 32])
                .with_transition("Dense", 1.0),
            NodeSpec::new("DecoderInput", NodeKind::Latent)
                .with_attribute("latent_size", [4])
                .with_transition("DecoderDense", 1.0),
            NodeSpec::new("DecoderDense", NodeKind::Flat)
                .with_attribute("units", [64, 128])
                .with_transition("DecoderDense", 1.0),
            NodeSpec::new("DecoderOutput", NodeKind::Output),
            NodeSpec::new("Output", NodeKind::Output),
        ],
    };
    Arc::new(StaticCatalog::new(def).unwrap())
}

// ============================================================================
// Evaluators
// ============================================================================

/// What [`ScriptedEvaluator`] builds: the path description plus how often it
/// was refined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedModel {
    pub layers: Vec<String>,
    pub parameters: f64,
    pub refinements: usize,
}

/// Deterministic evaluator. Loss shrinks with depth and with the integer
/// attribute values a path uses, so longer and wider paths win. Paths that
/// contain a node named `fail_on` fail to build.
#[derive(Default)]
pub struct ScriptedEvaluator {
    pub fail_on: Option<String>,
    pub built: AtomicUsize,
    pub refined: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(name: &str) -> Self {
        Self { fail_on: Some(name.into()), ..Self::default() }
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::Relaxed)
    }

    pub fn refined(&self) -> usize {
        self.refined.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    type Artifact = ScriptedModel;

    async fn generate_artifact(&self, path: &[PathNode]) -> Result<ScriptedModel> {
        if let Some(name) = &self.fail_on {
            if path.iter().any(|n| &n.name == name) {
                return Err(Error::Evaluation(format!("cannot build {name}")));
            }
        }
        self.built.fetch_add(1, Ordering::Relaxed);
        let parameters = path
            .iter()
            .flat_map(|n| n.attributes.iter())
            .filter_map(|a| a.value.as_int())
            .sum::<i64>() as f64;
        Ok(ScriptedModel {
            layers: path.iter().map(PathNode::describe).collect(),
            parameters,
            refinements: 0,
        })
    }

    async fn refine(&self, mut model: ScriptedModel) -> Result<(ScriptedModel, TrainingHistory)> {
        self.refined.fetch_add(1, Ordering::Relaxed);
        model.refinements += 1;
        let history = TrainingHistory {
            epochs: vec![EpochStats { loss: 1.0, accuracy: None }, EpochStats { loss: 0.5, accuracy: None }],
        };
        Ok((model, history))
    }

    async fn score(&self, model: &ScriptedModel) -> Result<Score> {
        let loss = 1.0 / (1.0 + model.layers.len() as f64 + model.parameters / 100.0);
        Ok(Score::new(loss, 1.0 - loss))
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Storage whose every call fails, counting the attempts.
#[derive(Default)]
pub struct UnavailableStorage {
    pub attempts: AtomicUsize,
}

impl UnavailableStorage {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    fn fail<T>(&self, what: &str) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(Error::Persistence(format!("{what}: storage unavailable")))
    }
}

#[async_trait]
impl Persistence<ScriptedModel> for UnavailableStorage {
    fn loaded_from_save(&self) -> bool {
        false
    }

    async fn load_artifact(&self, _hash: &str) -> Result<Option<ScriptedModel>> {
        self.fail("load_artifact")
    }

    async fn save_artifact(&self, _artifact: &ScriptedModel, _hash: &str, _cost: f64) -> Result<()> {
        self.fail("save_artifact")
    }

    async fn checkpoint(&self, _checkpoint: &Checkpoint) -> Result<()> {
        self.fail("checkpoint")
    }

    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        self.fail("load_checkpoint")
    }
}

pub fn names(path: &[PathNode]) -> Vec<&str> {
    path.iter().map(|n| n.name.as_str()).collect()
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("antgraph-e2e-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
