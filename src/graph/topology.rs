//! Arena storage for the layered graph.
//!
//! Every canonical node lives in `nodes`, addressed by [`NodeId`]. Layers map
//! a type name to the one record of that type at that depth. Edges only ever
//! point from depth `d` to depth `d + 1`, so the graph is a DAG by
//! construction.
//!
//! `Topology` carries no lock and no catalog. [`Graph`](super::Graph) owns
//! it behind a lock and passes the catalog in; checkpoints serialize it
//! as-is.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::model::{Attribute, NeighbourNode, NodeId, NodeKind, NodeRecord, PathNode};
use crate::pheromone::UpdateRule;
use crate::selection::SelectionRule;
use crate::{Error, Result};

/// Upper bound on closing nodes appended to one path.
const CLOSING_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) layers: Vec<HashMap<String, NodeId>>,
    pub(crate) current_depth: usize,
    pub(crate) input: NodeId,
    pub(crate) decoder_input: Option<NodeId>,
}

impl Topology {
    pub(crate) fn new(catalog: &dyn Catalog, start: f64, depth: usize) -> Result<Self> {
        let mut topology = Self {
            nodes: Vec::new(),
            layers: Vec::new(),
            current_depth: depth,
            input: NodeId(0),
            decoder_input: None,
        };
        topology.input = topology.get_node(catalog, catalog.input_type(), 0, start)?;
        if let Some(decoder) = catalog.decoder() {
            topology.decoder_input = Some(topology.get_node(catalog, &decoder.input, 0, start)?);
        }
        Ok(topology)
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn decoder_input(&self) -> Option<NodeId> {
        self.decoder_input
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn layers(&self) -> &[HashMap<String, NodeId>] {
        &self.layers
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeRecord> {
        self.nodes.get(id.0).ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    pub fn node_at(&self, depth: usize, name: &str) -> Option<NodeId> {
        self.layers.get(depth).and_then(|layer| layer.get(name)).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbours.len()).sum()
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Return the canonical node for `(depth, name)`, creating it from the
    /// catalog if this layer has not seen the type yet. Missing layers up to
    /// `depth` are added empty.
    pub(crate) fn get_node(
        &mut self,
        catalog: &dyn Catalog,
        name: &str,
        depth: usize,
        start: f64,
    ) -> Result<NodeId> {
        while self.layers.len() <= depth {
            self.layers.push(HashMap::new());
        }
        if let Some(&id) = self.layers[depth].get(name) {
            return Ok(id);
        }
        let id = NodeId(self.nodes.len());
        let record = materialize(catalog, id, name, depth, start)?;
        self.layers[depth].insert(name.to_owned(), id);
        self.nodes.push(record);
        Ok(id)
    }

    /// Expand `id` on first visit and report whether it has any neighbour.
    ///
    /// Expansion happens once per node; later calls only read the cached
    /// neighbour list.
    pub(crate) fn has_neighbours(&mut self, catalog: &dyn Catalog, id: NodeId, start: f64) -> Result<bool> {
        let record = self.node(id)?;
        if record.is_expanded {
            return Ok(!record.neighbours.is_empty());
        }
        let (name, depth) = (record.name.clone(), record.depth);

        let mut neighbours = Vec::new();
        for transition in catalog.available_transitions(&name) {
            if !(transition.heuristic.is_finite() && transition.heuristic > 0.0) {
                return Err(Error::Catalog(format!(
                    "{name} -> {} has heuristic {}",
                    transition.target, transition.heuristic
                )));
            }
            let next = self.get_node(catalog, &transition.target, depth + 1, start)?;
            neighbours.push(NeighbourNode::new(next, start, transition.heuristic));
        }

        let record = &mut self.nodes[id.0];
        record.neighbours = neighbours;
        record.is_expanded = true;
        Ok(!record.neighbours.is_empty())
    }

    // ========================================================================
    // Path generation
    // ========================================================================

    /// Walk from `entry` for at most `current_depth` steps, expanding nodes
    /// as they are reached. `first` is the already-bound copy of `entry`.
    pub(crate) fn walk(
        &mut self,
        catalog: &dyn Catalog,
        start: f64,
        entry: NodeId,
        first: PathNode,
        rule: &mut dyn SelectionRule,
    ) -> Result<Vec<PathNode>> {
        let mut path = vec![first];
        let mut current = entry;
        for _ in 0..self.current_depth {
            if !self.has_neighbours(catalog, current, start)? {
                break;
            }
            let record = &self.nodes[current.0];
            let choice = rule.select_neighbour(&record.neighbours)?;
            let next = record
                .neighbours
                .get(choice)
                .map(|n| n.node)
                .ok_or_else(|| Error::InvalidSelectionState(format!("neighbour index {choice} out of range")))?;
            path.push(rule.bind(&self.nodes[next.0])?);
            current = next;
        }
        Ok(path)
    }

    /// Append closing nodes until the path ends in a type the catalog
    /// considers complete. Closing nodes are not registered as edges.
    pub(crate) fn complete_path(
        &self,
        catalog: &dyn Catalog,
        start: f64,
        path: Vec<PathNode>,
    ) -> Result<Vec<PathNode>> {
        close_while(catalog, start, path, true, |_| true)
    }

    /// Close an encoder walk: only spatial endings get closing nodes, and
    /// never a terminal one. The decoder alone closes into an output type.
    pub(crate) fn complete_encoder_path(
        &self,
        catalog: &dyn Catalog,
        start: f64,
        path: Vec<PathNode>,
    ) -> Result<Vec<PathNode>> {
        close_while(catalog, start, path, false, |kind| {
            matches!(kind, NodeKind::Spatial | NodeKind::Input)
        })
    }

    /// Bind the decoder input's latent attribute from the encoder path and
    /// return the decoder entry copy.
    pub(crate) fn decoder_entry(
        &mut self,
        catalog: &dyn Catalog,
        start: f64,
        encoder: &[PathNode],
    ) -> Result<(NodeId, PathNode)> {
        let entry = self
            .decoder_input
            .ok_or_else(|| Error::Catalog("catalog has no decoder input".into()))?;
        let mut first = self.nodes[entry.0].create_copy();

        let Some(binding) = catalog.decoder().and_then(|d| d.latent.as_ref()) else {
            return Ok((entry, first));
        };
        let Some(value) = encoder.iter().rev().find_map(|n| n.get(&binding.source)).cloned() else {
            return Ok((entry, first));
        };
        let record = &mut self.nodes[entry.0];
        if let Some(attr) = record.attributes.iter_mut().find(|a| a.name == binding.target) {
            let index = attr.ensure_value(&value, start);
            if let Some(bound) = attr.bind(index) {
                match first.attributes.iter_mut().find(|b| b.name == binding.target) {
                    Some(slot) => *slot = bound,
                    None => first.attributes.push(bound),
                }
            }
        }
        Ok((entry, first))
    }

    // ========================================================================
    // Pheromone
    // ========================================================================

    /// Apply `rule` along `path`, starting at the input node.
    ///
    /// Each step looks for an edge from the current canonical node to a
    /// neighbour of the same type. The first step without such an edge ends
    /// the segment, so closing nodes never get credit. A decoder input in the
    /// path starts a new segment at the canonical decoder input. Returns the
    /// number of edges updated.
    pub(crate) fn update_pheromone(&mut self, path: &[PathNode], rule: &UpdateRule, cost: f64) -> usize {
        let decoder_name = self.decoder_input.map(|id| self.nodes[id.0].name.clone());
        let mut current = Some(self.input);
        let mut updated = 0;

        for node in path.iter().skip(1) {
            if decoder_name.as_deref() == Some(node.name.as_str()) {
                current = self.decoder_input;
                continue;
            }
            let Some(from) = current else { continue };

            let nodes = &self.nodes;
            let hit = nodes[from.0]
                .neighbours
                .iter()
                .position(|n| nodes[n.node.0].name == node.name);
            let Some(edge_index) = hit else {
                current = None;
                continue;
            };

            let edge = &mut self.nodes[from.0].neighbours[edge_index];
            edge.pheromone = rule.apply(edge.pheromone, cost);
            let target = edge.node;

            let record = &mut self.nodes[target.0];
            for bound in &node.attributes {
                if let Some(attr) = record.attributes.iter_mut().find(|a| a.name == bound.name) {
                    if let Some(p) = attr.pheromone.get_mut(bound.index) {
                        *p = rule.apply(*p, cost);
                    }
                }
            }

            updated += 1;
            current = Some(target);
        }
        updated
    }
}

/// Build a fresh record of `name` from the catalog.
fn materialize(catalog: &dyn Catalog, id: NodeId, name: &str, depth: usize, start: f64) -> Result<NodeRecord> {
    let kind = catalog
        .kind(name)
        .ok_or_else(|| Error::Catalog(format!("unknown node type {name}")))?;
    let mut attributes = Vec::new();
    for spec in catalog.attributes(name) {
        if spec.domain.is_empty() {
            return Err(Error::Catalog(format!("{name}.{} has an empty domain", spec.name)));
        }
        attributes.push(Attribute::new(spec.name, spec.domain, start));
    }
    Ok(NodeRecord::new(id, name, kind, depth, attributes))
}

/// Default-bound copy of `name` that is never inserted into a layer.
pub(crate) fn detached_copy(catalog: &dyn Catalog, name: &str, start: f64) -> Result<PathNode> {
    Ok(materialize(catalog, NodeId(usize::MAX), name, 0, start)?.create_copy())
}

fn close_while(
    catalog: &dyn Catalog,
    start: f64,
    mut path: Vec<PathNode>,
    into_terminal: bool,
    needs_closing: impl Fn(NodeKind) -> bool,
) -> Result<Vec<PathNode>> {
    for _ in 0..CLOSING_LIMIT {
        let Some(last) = path.last() else {
            return Err(Error::InvalidSelectionState("cannot complete an empty path".into()));
        };
        if !needs_closing(last.kind) {
            return Ok(path);
        }
        let Some(next) = catalog.closing_type(last.kind) else {
            return Ok(path);
        };
        if !into_terminal && catalog.kind(next).is_some_and(NodeKind::is_terminal) {
            return Ok(path);
        }
        path.push(detached_copy(catalog, next, start)?);
    }
    Err(Error::Catalog(format!(
        "closing rules did not terminate within {CLOSING_LIMIT} nodes"
    )))
}
