use chrono::{DateTime, Utc};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::Ant;
use crate::graph::Topology;

/// Everything needed to continue a search at the next depth boundary.
///
/// Taken after the depth increase, so `topology.current_depth()` is the
/// depth the next iteration walks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub topology: Topology,
    pub best_ant: Option<Ant>,
    /// Completed iterations.
    pub iteration: usize,
    /// Generator state, so a resumed run continues the same random stream.
    pub rng: ChaCha8Rng,
    pub saved_at: DateTime<Utc>,
}
