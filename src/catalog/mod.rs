//! # Node Catalog
//!
//! The catalog is the contract between the search engine and whatever
//! domain defines the node types. The engine never interprets a type name;
//! it only asks the catalog which types may follow a type, with what prior
//! weight, which attributes a type carries, and how an unfinished path is
//! closed.
//!
//! | Implementation | Description |
//! |----------------|-------------|
//! | [`StaticCatalog`] | Fixed tables, built in code or loaded from JSON |

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::{AttrValue, NodeKind};
use crate::{Error, Result};

// ============================================================================
// Catalog entries
// ============================================================================

/// A legal next type together with its static heuristic weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: String,
    #[serde(default = "unit_heuristic")]
    pub heuristic: f64,
}

fn unit_heuristic() -> f64 {
    1.0
}

impl Transition {
    pub fn new(target: impl Into<String>, heuristic: f64) -> Self {
        Self { target: target.into(), heuristic }
    }
}

/// Attribute name with its domain of legal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub domain: Vec<AttrValue>,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, domain: impl IntoIterator<Item = impl Into<AttrValue>>) -> Self {
        Self { name: name.into(), domain: domain.into_iter().map(Into::into).collect() }
    }
}

/// Binds the decoder input's `target` attribute from the `source`
/// attribute of the last encoder node that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentBinding {
    pub source: String,
    pub target: String,
}

/// Entry and exit types of the decoder half of an autoencoder path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderSpec {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub latent: Option<LatentBinding>,
}

// ============================================================================
// Catalog trait
// ============================================================================

/// Node/attribute domain provider.
pub trait Catalog: Send + Sync {
    /// Entry type of every path.
    fn input_type(&self) -> &str;

    /// Terminal type of every path.
    fn output_type(&self) -> &str;

    /// Category of a type. `None` for unknown types.
    fn kind(&self, node_type: &str) -> Option<NodeKind>;

    /// Types that may follow `node_type`, in registration order.
    fn available_transitions(&self, node_type: &str) -> Vec<Transition>;

    /// Attributes of `node_type`, in declaration order.
    fn attributes(&self, node_type: &str) -> Vec<AttributeSpec>;

    /// Type appended after a path ending in `kind`. `None` when the path is complete.
    fn closing_type(&self, kind: NodeKind) -> Option<&str>;

    /// Decoder entry/exit types, when the catalog supports autoencoder paths.
    fn decoder(&self) -> Option<&DecoderSpec> {
        None
    }
}

// ============================================================================
// StaticCatalog
// ============================================================================

/// One node type of a [`CatalogDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self { name: name.into(), kind, attributes: Vec::new(), transitions: Vec::new() }
    }

    pub fn with_attribute(mut self, name: &str, domain: impl IntoIterator<Item = impl Into<AttrValue>>) -> Self {
        self.attributes.push(AttributeSpec::new(name, domain));
        self
    }

    pub fn with_transition(mut self, target: &str, heuristic: f64) -> Self {
        self.transitions.push(Transition::new(target, heuristic));
        self
    }
}

/// Serializable description of a [`StaticCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDef {
    pub input: String,
    pub output: String,
    /// Type appended after a spatial node. Without it spatial paths close straight into `output`.
    #[serde(default)]
    pub flatten: Option<String>,
    /// Whether the input produces spatial output (images) rather than a flat vector.
    #[serde(default = "default_spatial_input")]
    pub spatial_input: bool,
    #[serde(default)]
    pub decoder: Option<DecoderSpec>,
    pub nodes: Vec<NodeSpec>,
}

fn default_spatial_input() -> bool {
    true
}

/// Table-driven catalog.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    def: CatalogDef,
    /// name → index into `def.nodes`
    index: HashMap<String, usize>,
}

impl StaticCatalog {
    /// Build and validate a catalog.
    pub fn new(def: CatalogDef) -> Result<Self> {
        let mut index = HashMap::with_capacity(def.nodes.len());
        for (i, spec) in def.nodes.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(Error::Catalog(format!("duplicate node type {}", spec.name)));
            }
        }
        let catalog = Self { def, index };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn definition(&self) -> &CatalogDef {
        &self.def
    }

    fn spec(&self, node_type: &str) -> Option<&NodeSpec> {
        self.index.get(node_type).map(|&i| &self.def.nodes[i])
    }

    fn validate(&self) -> Result<()> {
        let mut required = vec![&self.def.input, &self.def.output];
        required.extend(self.def.flatten.as_ref());
        if let Some(decoder) = &self.def.decoder {
            required.push(&decoder.input);
            required.push(&decoder.output);
        }
        for name in required {
            if self.spec(name).is_none() {
                return Err(Error::Catalog(format!("unknown node type {name}")));
            }
        }

        for spec in &self.def.nodes {
            for attr in &spec.attributes {
                if attr.domain.is_empty() {
                    return Err(Error::Catalog(format!(
                        "{}.{} has an empty domain",
                        spec.name, attr.name
                    )));
                }
            }
            for t in &spec.transitions {
                if self.spec(&t.target).is_none() {
                    return Err(Error::Catalog(format!(
                        "{} transitions to unknown type {}",
                        spec.name, t.target
                    )));
                }
                if !(t.heuristic.is_finite() && t.heuristic > 0.0) {
                    return Err(Error::Catalog(format!(
                        "{} -> {} has heuristic {}",
                        spec.name, t.target, t.heuristic
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Catalog for StaticCatalog {
    fn input_type(&self) -> &str {
        &self.def.input
    }

    fn output_type(&self) -> &str {
        &self.def.output
    }

    fn kind(&self, node_type: &str) -> Option<NodeKind> {
        self.spec(node_type).map(|s| s.kind)
    }

    fn available_transitions(&self, node_type: &str) -> Vec<Transition> {
        self.spec(node_type).map(|s| s.transitions.clone()).unwrap_or_default()
    }

    fn attributes(&self, node_type: &str) -> Vec<AttributeSpec> {
        self.spec(node_type).map(|s| s.attributes.clone()).unwrap_or_default()
    }

    fn closing_type(&self, kind: NodeKind) -> Option<&str> {
        let flatten_or_output = || self.def.flatten.as_deref().or(Some(self.def.output.as_str()));
        match kind {
            k if k.is_terminal() => None,
            NodeKind::Spatial => flatten_or_output(),
            NodeKind::Input if self.def.spatial_input => flatten_or_output(),
            _ => Some(self.def.output.as_str()),
        }
    }

    fn decoder(&self) -> Option<&DecoderSpec> {
        self.def.decoder.as_ref()
    }
}
