//! Canonical node in the layered search graph.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Attribute, NeighbourNode, PathNode};
use crate::selection::SelectionRule;
use crate::Result;

/// Opaque node identifier: an index into the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a node type. Drives the closing rules applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry of a path (the input node, or the decoder input).
    Input,
    /// Produces multi-dimensional output that must be flattened before output.
    Spatial,
    /// Produces a flat vector.
    Flat,
    /// End of an encoder; flat in shape.
    Latent,
    /// Terminal node.
    Output,
    Custom,
}

impl NodeKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeKind::Output)
    }
}

/// The single shared instance of a node type at one depth.
///
/// Every ant that visits `(depth, name)` walks through this record and its
/// edges. Ants never hold a reference to it; they carry a [`PathNode`]
/// produced by one of the binding methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub attributes: Vec<Attribute>,
    /// Populated once, by the graph's expansion routine.
    pub neighbours: Vec<NeighbourNode>,
    pub is_expanded: bool,
}

impl NodeRecord {
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        depth: usize,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            depth,
            attributes,
            neighbours: Vec::new(),
            is_expanded: false,
        }
    }

    /// Copy bound to the first value of every attribute domain.
    pub fn create_copy(&self) -> PathNode {
        self.bind_indices(|_| 0)
    }

    /// Copy with every attribute drawn uniformly from its domain. This is how
    /// [`RandomSelect`](crate::selection::RandomSelect) binds the baseline ant.
    pub fn select_random_attributes<R: Rng + ?Sized>(&self, rng: &mut R) -> PathNode {
        self.bind_indices(|attr| rng.random_range(0..attr.len()))
    }

    /// Copy with every attribute chosen by `rule` over its pheromone weights.
    pub fn select_custom_attributes(&self, rule: &mut dyn SelectionRule) -> Result<PathNode> {
        let mut bound = SmallVec::new();
        for attr in &self.attributes {
            let index = rule.select_attribute(attr)?;
            if let Some(b) = attr.bind(index) {
                bound.push(b);
            }
        }
        Ok(PathNode { name: self.name.clone(), kind: self.kind, attributes: bound })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn bind_indices(&self, mut pick: impl FnMut(&Attribute) -> usize) -> PathNode {
        let attributes = self
            .attributes
            .iter()
            .filter(|a| !a.is_empty())
            .filter_map(|a| a.bind(pick(a)))
            .collect();
        PathNode { name: self.name.clone(), kind: self.kind, attributes }
    }
}
