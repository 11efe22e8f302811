//! # Selection Rules
//!
//! How an ant picks its next node and the values of that node's attributes.
//!
//! | Rule | Used for | Behaviour |
//! |------|----------|-----------|
//! | [`RandomSelect`] | baseline ant of a fresh search | uniform over neighbours and domain values |
//! | [`AcoSelect`] | every other ant | greedy with probability `greediness`, roulette otherwise |
//!
//! The ACO rule is the same two-branch decision for edges (weight =
//! `pheromone × heuristic`) and for attribute values (weight = pheromone,
//! heuristic fixed at 1). The weight-level functions are exposed on their
//! own so the branches can be tested with explicit draws.

use rand::Rng;

use crate::model::{Attribute, NeighbourNode, NodeRecord, PathNode};
use crate::{Error, Result};

/// A policy choosing one entry out of a non-empty candidate list.
///
/// Callers gate on [`Graph::has_neighbours`](crate::graph::Graph::has_neighbours);
/// an empty list is an [`Error::InvalidSelectionState`].
pub trait SelectionRule {
    /// Index of the chosen neighbour.
    fn select_neighbour(&mut self, neighbours: &[NeighbourNode]) -> Result<usize>;

    /// Index of the chosen value in `attribute.domain`.
    fn select_attribute(&mut self, attribute: &Attribute) -> Result<usize>;

    /// Detached copy of `node` with every attribute bound by this rule.
    fn bind(&mut self, node: &NodeRecord) -> Result<PathNode>;
}

// ============================================================================
// Random rule
// ============================================================================

/// Uniform choice, ignoring pheromone and heuristic.
pub struct RandomSelect<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
}

impl<'r, R: Rng + ?Sized> RandomSelect<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + ?Sized> SelectionRule for RandomSelect<'_, R> {
    fn select_neighbour(&mut self, neighbours: &[NeighbourNode]) -> Result<usize> {
        uniform_index(neighbours.len(), &mut *self.rng, "neighbour list")
    }

    fn select_attribute(&mut self, attribute: &Attribute) -> Result<usize> {
        uniform_index(attribute.len(), &mut *self.rng, &attribute.name)
    }

    fn bind(&mut self, node: &NodeRecord) -> Result<PathNode> {
        Ok(node.select_random_attributes(&mut *self.rng))
    }
}

fn uniform_index<R: Rng + ?Sized>(len: usize, rng: &mut R, what: &str) -> Result<usize> {
    if len == 0 {
        return Err(Error::InvalidSelectionState(format!("empty {what}")));
    }
    Ok(rng.random_range(0..len))
}

// ============================================================================
// ACO rule
// ============================================================================

/// Ant colony system transition rule.
pub struct AcoSelect<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    greediness: f64,
}

impl<'r, R: Rng + ?Sized> AcoSelect<'r, R> {
    pub fn new(rng: &'r mut R, greediness: f64) -> Self {
        Self { rng, greediness }
    }
}

impl<R: Rng + ?Sized> SelectionRule for AcoSelect<'_, R> {
    fn select_neighbour(&mut self, neighbours: &[NeighbourNode]) -> Result<usize> {
        let weights: Vec<f64> = neighbours.iter().map(NeighbourNode::weight).collect();
        aco_select_rule(&weights, self.greediness, &mut *self.rng)
    }

    fn select_attribute(&mut self, attribute: &Attribute) -> Result<usize> {
        aco_select_rule(&attribute.pheromone, self.greediness, &mut *self.rng)
    }

    fn bind(&mut self, node: &NodeRecord) -> Result<PathNode> {
        node.select_custom_attributes(self)
    }
}

/// Draw `r ~ U[0, 1)`; exploit when `r <= greediness`, explore otherwise.
pub fn aco_select_rule<R: Rng + ?Sized>(weights: &[f64], greediness: f64, rng: &mut R) -> Result<usize> {
    if weights.is_empty() {
        return Err(Error::InvalidSelectionState("empty weight list".into()));
    }
    let r: f64 = rng.random();
    if r <= greediness {
        return greedy_select(weights, rng);
    }
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(Error::InvalidSelectionState(format!("weights sum to {total}")));
    }
    let threshold = rng.random::<f64>() * total;
    roulette_select(weights, threshold)
}

/// Index of the maximum weight. Exact ties are broken uniformly at random.
pub fn greedy_select<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ties: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w == max)
        .map(|(i, _)| i)
        .collect();
    match ties.len() {
        0 => Err(Error::InvalidSelectionState("no comparable weights".into())),
        1 => Ok(ties[0]),
        n => Ok(ties[rng.random_range(0..n)]),
    }
}

/// Walk the cumulative weights and return the first index whose running
/// sum strictly exceeds `threshold` (expected in `[0, Σweights)`).
pub fn roulette_select(weights: &[f64], threshold: f64) -> Result<usize> {
    if weights.is_empty() {
        return Err(Error::InvalidSelectionState("empty weight list".into()));
    }
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return Ok(i);
        }
    }
    // threshold == Σweights through rounding
    Ok(weights.len() - 1)
}
