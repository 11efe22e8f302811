//! # Search Graph Model
//!
//! Plain data shared by the graph, the selection rules and the ants.
//!
//! Canonical nodes ([`NodeRecord`]) own pheromone. Ants only ever hold
//! [`PathNode`] copies with one value bound per attribute.
//!
//! Design rule: no locks, no I/O, no async in this module.

pub mod attribute;
pub mod neighbour;
pub mod node;
pub mod path;
pub mod value;

pub use attribute::Attribute;
pub use neighbour::NeighbourNode;
pub use node::{NodeId, NodeKind, NodeRecord};
pub use path::{BoundAttribute, PathNode, describe_path};
pub use value::AttrValue;
