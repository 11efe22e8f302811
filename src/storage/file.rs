//! Directory-backed persistence.
//!
//! ```text
//! <root>/
//!   checkpoint.json          latest controller snapshot
//!   artifacts/<hash>.json    { "hash", "cost", "artifact" }
//! ```
//!
//! The checkpoint is written to `checkpoint.json.tmp` and renamed into
//! place, so a crash mid-write leaves the previous checkpoint readable.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::Persistence;
use crate::aco::Checkpoint;
use crate::{Error, Result};

const CHECKPOINT_FILE: &str = "checkpoint.json";
const ARTIFACT_DIR: &str = "artifacts";

#[derive(Serialize, Deserialize)]
struct ArtifactFile<A> {
    hash: String,
    cost: f64,
    artifact: A,
}

/// JSON files under one root directory.
#[derive(Debug)]
pub struct JsonFileStorage<A> {
    root: PathBuf,
    resumed: bool,
    _artifact: PhantomData<fn() -> A>,
}

impl<A> JsonFileStorage<A> {
    /// Open (creating if needed) a storage directory. `loaded_from_save` is
    /// fixed here: true iff a checkpoint already exists.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(ARTIFACT_DIR)).await?;
        let resumed = fs::try_exists(root.join(CHECKPOINT_FILE)).await?;
        debug!(root = %root.display(), resumed, "opened file storage");
        Ok(Self { root, resumed, _artifact: PhantomData })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn checkpoint_path(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }

    fn artifact_path(&self, hash: &str) -> Result<PathBuf> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Persistence(format!("invalid artifact hash {hash:?}")));
        }
        Ok(self.root.join(ARTIFACT_DIR).join(format!("{hash}.json")))
    }
}

/// File contents, or `None` when the file does not exist.
async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl<A> Persistence<A> for JsonFileStorage<A>
where
    A: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn loaded_from_save(&self) -> bool {
        self.resumed
    }

    async fn load_artifact(&self, hash: &str) -> Result<Option<A>> {
        let Some(bytes) = read_optional(&self.artifact_path(hash)?).await? else {
            return Ok(None);
        };
        let file: ArtifactFile<A> = serde_json::from_slice(&bytes)?;
        Ok(Some(file.artifact))
    }

    async fn save_artifact(&self, artifact: &A, hash: &str, cost: f64) -> Result<()> {
        let path = self.artifact_path(hash)?;
        let file = ArtifactFile { hash: hash.to_owned(), cost, artifact };
        fs::write(path, serde_json::to_vec_pretty(&file)?).await?;
        Ok(())
    }

    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.checkpoint_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(checkpoint)?).await?;
        fs::rename(&tmp, &path).await?;
        debug!(iteration = checkpoint.iteration, path = %path.display(), "checkpoint written");
        Ok(())
    }

    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        match read_optional(&self.checkpoint_path()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
