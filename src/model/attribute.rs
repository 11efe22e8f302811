//! Attribute catalog entries with per-value pheromone weights.

use serde::{Deserialize, Serialize};

use super::{AttrValue, BoundAttribute};

/// A selectable attribute of a canonical node.
///
/// `domain[i]` and `pheromone[i]` describe the same value. Path copies refer
/// to a value by that index, so the two vectors only ever grow together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub domain: Vec<AttrValue>,
    pub pheromone: Vec<f64>,
}

impl Attribute {
    /// Create an attribute whose values all start at `start` pheromone.
    pub fn new(name: impl Into<String>, domain: Vec<AttrValue>, start: f64) -> Self {
        let pheromone = vec![start; domain.len()];
        Self { name: name.into(), domain, pheromone }
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    /// Index of `value` inside the domain.
    pub fn position(&self, value: &AttrValue) -> Option<usize> {
        self.domain.iter().position(|v| v == value)
    }

    /// Pheromone weight currently attached to `value`.
    pub fn pheromone_of(&self, value: &AttrValue) -> Option<f64> {
        self.position(value).map(|i| self.pheromone[i])
    }

    /// Bind the value at `index` for a path copy.
    pub fn bind(&self, index: usize) -> Option<BoundAttribute> {
        self.domain.get(index).map(|value| BoundAttribute {
            name: self.name.clone(),
            value: value.clone(),
            index,
        })
    }

    /// Return the index of `value`, appending it with `start` pheromone when
    /// the domain does not contain it yet.
    pub(crate) fn ensure_value(&mut self, value: &AttrValue, start: f64) -> usize {
        match self.position(value) {
            Some(i) => i,
            None => {
                self.domain.push(value.clone());
                self.pheromone.push(start);
                self.domain.len() - 1
            }
        }
    }
}
