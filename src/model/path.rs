//! Path — the ordered node copies carried by one ant.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{AttrValue, NodeKind};

/// An attribute value chosen for one path node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundAttribute {
    pub name: String,
    pub value: AttrValue,
    /// Position of `value` in the canonical attribute's domain.
    pub index: usize,
}

/// A private, attribute-bound copy of a node.
///
/// Holds no handle into the graph: pheromone updates find the canonical
/// record again by walking edges from the entry node and matching `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub name: String,
    pub kind: NodeKind,
    pub attributes: SmallVec<[BoundAttribute; 4]>,
}

impl PathNode {
    pub fn get(&self, attr: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|a| a.name == attr).map(|a| &a.value)
    }

    /// `Name(attr:value, attr:value)`
    pub fn describe(&self) -> String {
        let attrs: Vec<String> = self
            .attributes
            .iter()
            .map(|a| format!("{}:{}", a.name, a.value))
            .collect();
        format!("{}({})", self.name, attrs.join(", "))
    }
}

/// Describe a whole path: node descriptions joined by ` -> `.
pub fn describe_path(path: &[PathNode]) -> String {
    path.iter().map(PathNode::describe).collect::<Vec<_>>().join(" -> ")
}
