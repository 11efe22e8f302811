//! # Search Graph
//!
//! The shared, depth-layered topology every ant walks.
//!
//! ```text
//!  depth 0        depth 1          depth 2
//! ┌───────┐     ┌─────────┐      ┌─────────┐
//! │ Input │──┬─▶│ Conv2D  │──┬──▶│ Conv2D  │ ...
//! └───────┘  │  └─────────┘  └──▶│ Flatten │
//!            └─▶│ Dense   │─────▶│ Dense   │
//!               └─────────┘      └─────────┘
//! ```
//!
//! One canonical [`NodeRecord`] per `(depth, type)`; edges and attribute
//! pheromone live on those records. Ants get private [`PathNode`] copies and
//! feed results back through [`Graph::update_pheromone`].
//!
//! ## Locking
//!
//! The topology sits behind one `RwLock`. Path generation takes the write
//! lock for the whole walk because it may expand nodes; pheromone updates
//! take it per path. Expansion therefore happens at most once per node, and
//! every read/modify/write of a pheromone value is atomic with respect to
//! other walks and updates.

mod topology;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::model::{NodeId, NodeRecord, PathNode};
use crate::pheromone::UpdateRule;
use crate::selection::SelectionRule;
use crate::{Error, Result};

pub use topology::Topology;

/// Shared search graph.
pub struct Graph {
    catalog: Arc<dyn Catalog>,
    pheromone_start: f64,
    topology: RwLock<Topology>,
}

impl Graph {
    /// Create a graph holding only the entry node(s), at depth 0.
    pub fn new(catalog: Arc<dyn Catalog>, pheromone_start: f64) -> Result<Self> {
        Self::with_depth(catalog, pheromone_start, 0)
    }

    /// Create a graph whose search horizon starts at `depth`.
    pub fn with_depth(catalog: Arc<dyn Catalog>, pheromone_start: f64, depth: usize) -> Result<Self> {
        let topology = Topology::new(catalog.as_ref(), pheromone_start, depth)?;
        Ok(Self { catalog, pheromone_start, topology: RwLock::new(topology) })
    }

    /// Rebuild a graph from a checkpointed topology.
    pub fn from_topology(catalog: Arc<dyn Catalog>, pheromone_start: f64, topology: Topology) -> Self {
        Self { catalog, pheromone_start, topology: RwLock::new(topology) }
    }

    /// Consistent copy of the current topology.
    pub fn snapshot(&self) -> Topology {
        self.topology.read().clone()
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn input_node(&self) -> NodeId {
        self.topology.read().input()
    }

    pub fn current_depth(&self) -> usize {
        self.topology.read().current_depth()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRecord> {
        self.topology.read().node(id).ok().cloned()
    }

    pub fn node_at(&self, depth: usize, name: &str) -> Option<NodeId> {
        self.topology.read().node_at(depth, name)
    }

    pub fn node_count(&self) -> usize {
        self.topology.read().nodes().len()
    }

    pub fn layer_count(&self) -> usize {
        self.topology.read().layers().len()
    }

    pub fn edge_count(&self) -> usize {
        self.topology.read().edge_count()
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Idempotent upsert of the canonical `(depth, name)` node.
    pub fn get_node(&self, name: &str, depth: usize) -> Result<NodeId> {
        self.topology
            .write()
            .get_node(self.catalog.as_ref(), name, depth, self.pheromone_start)
    }

    /// Expand `id` on first call; report whether it has neighbours.
    pub fn has_neighbours(&self, id: NodeId) -> Result<bool> {
        self.topology
            .write()
            .has_neighbours(self.catalog.as_ref(), id, self.pheromone_start)
    }

    /// Let later walks go one step deeper.
    pub fn increase_depth(&self) {
        let mut topology = self.topology.write();
        topology.current_depth += 1;
        debug!(depth = topology.current_depth, "graph depth increased");
    }

    // ========================================================================
    // Path generation
    // ========================================================================

    /// Walk from the input node using `rule`, then close the path.
    pub fn generate_path(&self, rule: &mut dyn SelectionRule) -> Result<Vec<PathNode>> {
        let catalog = self.catalog.as_ref();
        let mut topology = self.topology.write();
        let entry = topology.input();
        let first = topology.node(entry)?.create_copy();
        let path = topology.walk(catalog, self.pheromone_start, entry, first, rule)?;
        topology.complete_path(catalog, self.pheromone_start, path)
    }

    /// Append the catalog's closing nodes to `path`.
    pub fn complete_path(&self, path: Vec<PathNode>) -> Result<Vec<PathNode>> {
        self.topology
            .read()
            .complete_path(self.catalog.as_ref(), self.pheromone_start, path)
    }

    /// Encoder half of an autoencoder path: walk from the input node and
    /// close spatial endings only.
    pub fn generate_encoder_path(&self, rule: &mut dyn SelectionRule) -> Result<Vec<PathNode>> {
        let catalog = self.catalog.as_ref();
        let mut topology = self.topology.write();
        let entry = topology.input();
        let first = topology.node(entry)?.create_copy();
        let path = topology.walk(catalog, self.pheromone_start, entry, first, rule)?;
        topology.complete_encoder_path(catalog, self.pheromone_start, path)
    }

    /// Decoder half: seeded from the decoder input with its latent attribute
    /// bound from `encoder`, always closed into the decoder output.
    pub fn generate_decoder_path(
        &self,
        rule: &mut dyn SelectionRule,
        encoder: &[PathNode],
    ) -> Result<Vec<PathNode>> {
        let catalog = self.catalog.as_ref();
        let decoder = catalog
            .decoder()
            .ok_or_else(|| Error::Catalog("catalog has no decoder".into()))?;
        let mut topology = self.topology.write();
        let (entry, first) = topology.decoder_entry(catalog, self.pheromone_start, encoder)?;
        let mut path = topology.walk(catalog, self.pheromone_start, entry, first, rule)?;
        if path.last().map(|n| n.name.as_str()) != Some(decoder.output.as_str()) {
            let output = topology::detached_copy(catalog, &decoder.output, self.pheromone_start)?;
            path.push(output);
        }
        Ok(path)
    }

    /// Encoder path followed by the decoder path it seeds.
    pub fn generate_autoencoder_path(&self, rule: &mut dyn SelectionRule) -> Result<Vec<PathNode>> {
        let mut path = self.generate_encoder_path(rule)?;
        let decoder = self.generate_decoder_path(rule, &path)?;
        path.extend(decoder);
        Ok(path)
    }

    // ========================================================================
    // Pheromone
    // ========================================================================

    /// Apply `rule` to every edge and attribute value `path` used.
    pub fn update_pheromone(&self, path: &[PathNode], rule: &UpdateRule, cost: f64) -> usize {
        let updated = self.topology.write().update_pheromone(path, rule, cost);
        debug!(rule = rule.name(), cost, edges = updated, "pheromone updated");
        updated
    }

    /// Plain-text dump of every edge and attribute weight.
    pub fn pheromone_report(&self) -> String {
        let topology = self.topology.read();
        let mut out = Vec::new();
        // Writing into a Vec<u8> cannot fail.
        let _ = crate::export::write_pheromone_report(&topology, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Log the pheromone state. Read-only.
    pub fn show_pheromone(&self, verbose: bool) {
        if !verbose {
            debug!(
                nodes = self.node_count(),
                edges = self.edge_count(),
                "pheromone report suppressed (pheromone.verbose = false)"
            );
            return;
        }
        for line in self.pheromone_report().lines() {
            info!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDef, DecoderSpec, NodeSpec, StaticCatalog};
    use crate::model::{AttrValue, NodeKind};
    use crate::selection::{AcoSelect, RandomSelect};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn image_catalog() -> Arc<dyn Catalog> {
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
                    .with_attribute("filter_count", [16, 32])
                    .with_transition("Conv2D", 1.0)
                    .with_transition("Flatten", 1.0),
                NodeSpec::new("Flatten", NodeKind::Flat).with_transition("Dense", 1.0),
                NodeSpec::new("Dense", NodeKind::Flat)
                    .with_attribute("units", [32, 64])
                    .with_transition("Dense", 1.0),
                NodeSpec::new("Output", NodeKind::Output),
            ],
        };
        Arc::new(StaticCatalog::new(def).unwrap())
    }

    fn names(path: &[PathNode]) -> Vec<&str> {
        path.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_new_graph_holds_input_only() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.layer_count(), 1);
        assert_eq!(graph.current_depth(), 0);
        assert_eq!(graph.node_at(0, "Input"), Some(graph.input_node()));
    }

    #[test]
    fn test_get_node_is_idempotent() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let a = graph.get_node("Dense", 3).unwrap();
        let b = graph.get_node("Dense", 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(graph.layer_count(), 4);
        assert_ne!(graph.get_node("Dense", 2).unwrap(), a);
        assert!(graph.get_node("Pool", 1).is_err());
    }

    #[test]
    fn test_expansion_happens_once() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let input = graph.input_node();
        assert!(!graph.node(input).unwrap().is_expanded);

        assert!(graph.has_neighbours(input).unwrap());
        let first = graph.node(input).unwrap();
        assert!(first.is_expanded);
        assert_eq!(first.neighbours.len(), 2);

        assert!(graph.has_neighbours(input).unwrap());
        let second = graph.node(input).unwrap();
        assert_eq!(first.neighbours, second.neighbours);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_neighbours_live_one_layer_down() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let conv = graph.get_node("Conv2D", 1).unwrap();
        graph.has_neighbours(conv).unwrap();
        for edge in graph.node(conv).unwrap().neighbours {
            assert_eq!(graph.node(edge.node).unwrap().depth, 2);
        }
    }

    #[test]
    fn test_output_has_no_neighbours() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let output = graph.get_node("Output", 1).unwrap();
        assert!(!graph.has_neighbours(output).unwrap());
        assert!(graph.node(output).unwrap().is_expanded);
    }

    #[test]
    fn test_depth_zero_path_is_closed() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let path = graph.generate_path(&mut RandomSelect::new(&mut rng)).unwrap();
        assert_eq!(names(&path), vec!["Input", "Flatten", "Output"]);
    }

    #[test]
    fn test_path_length_bounded_by_depth() {
        let graph = Graph::with_depth(image_catalog(), 0.1, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let path = graph.generate_path(&mut AcoSelect::new(&mut rng, 0.5)).unwrap();
            assert!(path.len() <= 3 + 1 + 2, "{:?}", names(&path));
            assert_eq!(path.last().unwrap().kind, NodeKind::Output);
        }
    }

    #[test]
    fn test_complete_path_rules() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let conv = graph.get_node("Conv2D", 1).unwrap();
        let dense = graph.get_node("Dense", 1).unwrap();
        let output = graph.get_node("Output", 1).unwrap();

        let spatial = vec![graph.node(conv).unwrap().create_copy()];
        assert_eq!(names(&graph.complete_path(spatial).unwrap()), vec!["Conv2D", "Flatten", "Output"]);

        let flat = vec![graph.node(dense).unwrap().create_copy()];
        assert_eq!(names(&graph.complete_path(flat).unwrap()), vec!["Dense", "Output"]);

        let done = vec![graph.node(output).unwrap().create_copy()];
        assert_eq!(names(&graph.complete_path(done).unwrap()), vec!["Output"]);
    }

    #[test]
    fn test_closing_nodes_are_not_edges() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        graph.generate_path(&mut RandomSelect::new(&mut rng)).unwrap();
        // depth 0: nothing was expanded, closing nodes were detached copies
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_update_pheromone_walks_real_edges() {
        let graph = Graph::with_depth(image_catalog(), 1.0, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let path = graph.generate_path(&mut AcoSelect::new(&mut rng, 0.5)).unwrap();

        let rule = UpdateRule::Local { decay: 0.5, start: 0.0 };
        // both walked steps are edges; the closing tail is not
        assert_eq!(graph.update_pheromone(&path, &rule, 1.0), 2, "{:?}", names(&path));

        let input = graph.node(graph.input_node()).unwrap();
        let hit = input
            .neighbours
            .iter()
            .find(|e| graph.node(e.node).unwrap().name == path[1].name)
            .unwrap();
        assert_eq!(hit.pheromone, 0.5);
    }

    #[test]
    fn test_attribute_pheromone_follows_bound_value() {
        let graph = Graph::with_depth(image_catalog(), 1.0, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut path;
        loop {
            path = graph.generate_path(&mut RandomSelect::new(&mut rng)).unwrap();
            if path[1].name == "Dense" {
                break;
            }
        }
        let units = path[1].get("units").cloned().unwrap();
        graph.update_pheromone(&path, &UpdateRule::Local { decay: 0.5, start: 0.0 }, 1.0);

        let dense = graph.node(graph.node_at(1, "Dense").unwrap()).unwrap();
        let attr = dense.attribute("units").unwrap();
        assert_eq!(attr.pheromone_of(&units), Some(0.5));
        let other = if units == AttrValue::Int(32) { AttrValue::Int(64) } else { AttrValue::Int(32) };
        assert_eq!(attr.pheromone_of(&other), Some(1.0));
    }

    #[test]
    fn test_snapshot_round_trip_keeps_structure() {
        let catalog = image_catalog();
        let graph = Graph::with_depth(catalog.clone(), 0.1, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..5 {
            graph.generate_path(&mut AcoSelect::new(&mut rng, 0.5)).unwrap();
        }
        let restored = Graph::from_topology(catalog, 0.1, graph.snapshot());
        assert_eq!(restored.node_count(), graph.node_count());
        assert_eq!(restored.edge_count(), graph.edge_count());
        assert_eq!(restored.current_depth(), 3);
    }

    #[test]
    fn test_encoder_never_closes_into_output() {
        let def = CatalogDef {
            input: "Input".into(),
            output: "Output".into(),
            flatten: None,
            spatial_input: true,
            decoder: Some(DecoderSpec {
                input: "DecoderInput".into(),
                output: "DecoderOutput".into(),
                latent: None,
            }),
            nodes: vec![
                NodeSpec::new("Input", NodeKind::Input).with_transition("Conv2D", 1.0),
                NodeSpec::new("Conv2D", NodeKind::Spatial).with_transition("Conv2D", 1.0),
                NodeSpec::new("DecoderInput", NodeKind::Latent).with_transition("DecoderDense", 1.0),
                NodeSpec::new("DecoderDense", NodeKind::Flat).with_transition("DecoderDense", 1.0),
                NodeSpec::new("DecoderOutput", NodeKind::Output),
                NodeSpec::new("Output", NodeKind::Output),
            ],
        };
        let graph = Graph::with_depth(Arc::new(StaticCatalog::new(def).unwrap()), 0.1, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let path = graph.generate_autoencoder_path(&mut RandomSelect::new(&mut rng)).unwrap();
        assert_eq!(
            names(&path),
            vec!["Input", "Conv2D", "Conv2D", "DecoderInput", "DecoderDense", "DecoderDense", "DecoderOutput"]
        );
        assert_eq!(path.iter().filter(|n| n.kind.is_terminal()).count(), 1);
    }

    #[test]
    fn test_increase_depth() {
        let graph = Graph::new(image_catalog(), 0.1).unwrap();
        graph.increase_depth();
        graph.increase_depth();
        assert_eq!(graph.current_depth(), 2);
    }
}
