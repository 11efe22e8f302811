//! Directed, weighted edge from a canonical node to a candidate next node.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// An outgoing edge of a [`NodeRecord`](super::NodeRecord).
///
/// `node` is a handle into the graph arena, not ownership: many edges from
/// different parents at depth `d` point at the same record at depth `d + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourNode {
    pub node: NodeId,
    /// Learned weight. Kept above [`PHEROMONE_FLOOR`](crate::pheromone::PHEROMONE_FLOOR).
    pub pheromone: f64,
    /// Static prior supplied by the catalog when the edge was created.
    pub heuristic: f64,
}

impl NeighbourNode {
    pub fn new(node: NodeId, pheromone: f64, heuristic: f64) -> Self {
        Self { node, pheromone, heuristic }
    }

    /// Selection weight: `pheromone × heuristic`.
    pub fn weight(&self) -> f64 {
        self.pheromone * self.heuristic
    }
}
