//! In-memory persistence.
//!
//! This is the reference implementation of `Persistence`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **Nothing survives the process**: artifacts and checkpoints are gone
//!   when the last handle drops.
//! - **Unbounded history**: every checkpoint is kept. Long searches with
//!   large graphs grow without limit.
//!
//! Use this backend for:
//! - Testing the controller and resume logic
//! - Embedding the search in applications that don't need persistence

use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::Persistence;
use crate::aco::Checkpoint;
use crate::Result;

// ============================================================================
// MemoryStorage
// ============================================================================

/// One cached artifact and the cost it scored when saved.
#[derive(Debug, Clone)]
pub struct CachedArtifact<A> {
    pub artifact: A,
    pub cost: f64,
}

/// In-memory artifact cache and checkpoint history.
///
/// Cloning is cheap and clones share state, so a test can hand one handle
/// to the controller and inspect another.
pub struct MemoryStorage<A> {
    inner: Arc<MemoryInner<A>>,
}

struct MemoryInner<A> {
    artifacts: RwLock<HashMap<String, CachedArtifact<A>>>,
    /// oldest first
    checkpoints: RwLock<Vec<Checkpoint>>,
    resumed: bool,
}

impl<A> Clone for MemoryStorage<A> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<A> Default for MemoryStorage<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> MemoryStorage<A> {
    pub fn new() -> Self {
        Self::with_history(Vec::new(), false)
    }

    /// Storage that reports `loaded_from_save` and serves `checkpoint` as
    /// the latest snapshot.
    pub fn resumed_from(checkpoint: Checkpoint) -> Self {
        Self::with_history(vec![checkpoint], true)
    }

    fn with_history(checkpoints: Vec<Checkpoint>, resumed: bool) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                artifacts: RwLock::new(HashMap::new()),
                checkpoints: RwLock::new(checkpoints),
                resumed,
            }),
        }
    }

    pub fn artifact_count(&self) -> usize {
        self.inner.artifacts.read().len()
    }

    pub fn checkpoint_count(&self) -> usize {
        self.inner.checkpoints.read().len()
    }

    /// Cost recorded for `hash`, if cached.
    pub fn cached_cost(&self, hash: &str) -> Option<f64> {
        self.inner.artifacts.read().get(hash).map(|c| c.cost)
    }

    pub fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.inner.checkpoints.read().last().cloned()
    }
}

// ============================================================================
// Persistence impl
// ============================================================================

#[async_trait]
impl<A> Persistence<A> for MemoryStorage<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn loaded_from_save(&self) -> bool {
        self.inner.resumed
    }

    async fn load_artifact(&self, hash: &str) -> Result<Option<A>> {
        Ok(self.inner.artifacts.read().get(hash).map(|c| c.artifact.clone()))
    }

    async fn save_artifact(&self, artifact: &A, hash: &str, cost: f64) -> Result<()> {
        self.inner
            .artifacts
            .write()
            .insert(hash.to_owned(), CachedArtifact { artifact: artifact.clone(), cost });
        Ok(())
    }

    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.inner.checkpoints.write().push(checkpoint.clone());
        Ok(())
    }

    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        Ok(self.latest_checkpoint())
    }
}
