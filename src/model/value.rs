//! Attribute values bound to path nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One legal value of a node attribute.
///
/// Catalogs describe domains as plain JSON scalars, so the serde
/// representation is untagged: `[16, 32]`, `[0.1, 0.3]`, `["relu", "tanh"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

// ============================================================================
// Type checking
// ============================================================================

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "BOOLEAN",
            AttrValue::Int(_) => "INTEGER",
            AttrValue::Float(_) => "FLOAT",
            AttrValue::Str(_) => "STRING",
        }
    }

    /// Attempt to extract as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for AttrValue { fn from(v: bool) -> Self { AttrValue::Bool(v) } }
impl From<i32> for AttrValue { fn from(v: i32) -> Self { AttrValue::Int(v as i64) } }
impl From<i64> for AttrValue { fn from(v: i64) -> Self { AttrValue::Int(v) } }
impl From<f64> for AttrValue { fn from(v: f64) -> Self { AttrValue::Float(v) } }
impl From<String> for AttrValue { fn from(v: String) -> Self { AttrValue::Str(v) } }
impl From<&str> for AttrValue { fn from(v: &str) -> Self { AttrValue::Str(v.to_owned()) } }

// ============================================================================
// Display
// ============================================================================

/// Rendering used inside path descriptions, so it feeds the path hash.
/// Keep it stable.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(s) => write!(f, "{s}"),
        }
    }
}
