//! # Persistence Trait
//!
//! The contract between the search controller and durable storage. The
//! controller never touches the filesystem; it caches artifacts and writes
//! checkpoints through a [`Persistence`] implementation.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStorage` | `memory` | In-memory, for testing/embedding |
//! | `JsonFileStorage` | `file` | Directory of JSON files, survives restarts |
//!
//! ## Failure model
//!
//! Every method is fallible. The controller treats artifact cache failures
//! and checkpoint failures as non-fatal: they are logged with `warn!` and the
//! search continues in memory.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::aco::Checkpoint;
use crate::Result;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Artifact cache plus checkpoint store.
///
/// `A` is the evaluator's artifact type.
#[async_trait]
pub trait Persistence<A: Send + Sync + 'static>: Send + Sync {
    /// True when a previous run left a checkpoint to resume from.
    fn loaded_from_save(&self) -> bool;

    /// Look up a cached artifact by path hash.
    async fn load_artifact(&self, hash: &str) -> Result<Option<A>>;

    /// Cache an artifact under its path hash, with the cost it scored.
    async fn save_artifact(&self, artifact: &A, hash: &str, cost: f64) -> Result<()>;

    /// Persist a self-consistent controller snapshot.
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Latest checkpoint, if any.
    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>>;
}
