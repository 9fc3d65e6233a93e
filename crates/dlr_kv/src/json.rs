//! Projection of document trees into plain JSON values.
//!
//! The projection keeps object key order (serde_json's `preserve_order`) and
//! drops everything JSON cannot express: type flags collapse to their inner
//! value and binary blobs become byte arrays.

use crate::node::{DocumentNode, Value};
use serde_json::{Map, Number};

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => items.iter().map(Value::to_json).collect(),
            Value::Object(children) => serde_json::Value::Object(object_to_map(children)),
            Value::Flagged { value, .. } => value.to_json(),
            Value::Binary(bytes) => bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
        }
    }
}

fn object_to_map(children: &[DocumentNode]) -> Map<String, serde_json::Value> {
    children
        .iter()
        .map(|child| (child.name.clone(), child.value.to_json()))
        .collect()
}

/// Project a document's top-level object into an ordered name → value map.
///
/// Returns an empty map when the node is not an object.
pub fn to_flat_mapping(node: &DocumentNode) -> Map<String, serde_json::Value> {
    object_to_map(node.children())
}
