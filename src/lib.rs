//! # antgraph — Ant Colony Optimization over a growing layered graph
//!
//! Searches a space of layer sequences (neural-network architectures, or any
//! catalog of typed steps) with an ant colony system. Ants walk a shared,
//! depth-layered DAG that is expanded lazily; pheromone on edges and on
//! attribute values couples solution quality back into later walks.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Catalog`, `Evaluator` and `Persistence` are the seams
//!    to the outside world; the engine never trains or stores anything itself
//! 2. **Arena graph**: canonical nodes live in one arena, ants carry plain
//!    copies, so no ant ever aliases shared state
//! 3. **Pure update rules**: local and global pheromone rules are values that
//!    map `(old, cost)` to a new weight
//! 4. **One random stream**: every stochastic choice draws from one seeded
//!    generator that is checkpointed with the graph
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use antgraph::{Aco, SearchConfig, StaticCatalog, MemoryStorage};
//! # use antgraph::{Evaluator, PathNode, Score, TrainingHistory};
//! # struct MyEvaluator;
//! # #[async_trait::async_trait]
//! # impl Evaluator for MyEvaluator {
//! #     type Artifact = ();
//! #     async fn generate_artifact(&self, _: &[PathNode]) -> antgraph::Result<()> { Ok(()) }
//! #     async fn refine(&self, a: ()) -> antgraph::Result<((), TrainingHistory)> { Ok((a, TrainingHistory::default())) }
//! #     async fn score(&self, _: &()) -> antgraph::Result<Score> { Ok(Score::new(0.5, 0.5)) }
//! # }
//!
//! # async fn example(catalog_json: &str) -> antgraph::Result<()> {
//! let catalog = Arc::new(StaticCatalog::from_json_str(catalog_json)?);
//! let config = SearchConfig::new().with_depth(0, 5).with_ant_count(8).with_seed(7);
//!
//! let mut aco = Aco::new(config, catalog, MyEvaluator, MemoryStorage::new())?;
//! let best = aco.search().await?;
//! println!("{best}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Persistence Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `MemoryStorage` | In-memory artifact cache and checkpoint history |
//! | `JsonFileStorage` | Directory of JSON files, resumable across restarts |

// ============================================================================
// Modules
// ============================================================================

pub mod aco;
pub mod catalog;
pub mod config;
pub mod evaluator;
pub mod export;
pub mod graph;
pub mod model;
pub mod pheromone;
pub mod selection;
pub mod storage;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    AttrValue, Attribute, BoundAttribute, NeighbourNode, NodeId, NodeKind, NodeRecord, PathNode,
};

// ============================================================================
// Re-exports: Search
// ============================================================================

pub use aco::{Aco, Ant, Checkpoint, SearchState};
pub use catalog::{Catalog, CatalogDef, NodeSpec, StaticCatalog};
pub use config::{Metric, PathShape, PheromoneConfig, SearchConfig};
pub use graph::{Graph, Topology};
pub use pheromone::UpdateRule;
pub use selection::{AcoSelect, RandomSelect, SelectionRule};

// ============================================================================
// Re-exports: Collaborators
// ============================================================================

pub use evaluator::{EpochStats, Evaluator, Score, TrainingHistory};
pub use storage::{JsonFileStorage, MemoryStorage, Persistence};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid selection state: {0}")]
    InvalidSelectionState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Search finished without a successfully evaluated ant")]
    NoViableAnt,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
