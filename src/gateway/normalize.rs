//! Response shape normalization
//!
//! Decoded gateway bodies arrive as a `serde_json::Value` tree, which is already
//! a uniform map/sequence/scalar representation. What remains is deciding which
//! of those shapes the body has. Strings are never re-parsed: a string body is
//! a scalar whatever it contains.

use crate::gateway::types::FieldMap;
use serde_json::Value;

/// Top-level shape of a decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Mapping(FieldMap),
    Sequence(Vec<Value>),
    Scalar(Value),
}

impl Normalized {
    /// Mappings and sequences are both usable response bodies
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Mapping(map) => Value::Object(map),
            Self::Sequence(items) => Value::Array(items),
            Self::Scalar(value) => value,
        }
    }
}

/// Classify a decoded response body by its top-level shape
pub fn normalize(raw: Value) -> Normalized {
    match raw {
        Value::Object(map) => Normalized::Mapping(map),
        Value::Array(items) => Normalized::Sequence(items),
        scalar => Normalized::Scalar(scalar),
    }
}
