//! Refining under-specified schemas from a variable's literal default.
//!
//! Inference only adds shape. A node that already declares properties keeps
//! them; its children are refined recursively with the matching part of the
//! default. A node with no shape at all (`any` or no type) takes the shape of
//! the default. A map whose default is a non-empty object gains one property
//! per key, each required.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schema::{AdditionalProperties, Kind, SchemaNode};

/// Refine `node` in place using the literal `default`.
pub fn refine(node: &mut SchemaNode, default: &Value) {
    if default.is_null() {
        return;
    }
    let node = node.value_variant_mut();
    if !node.has_shape() {
        if let Some(shape) = shape_of(default) {
            tracing::debug!(kind = ?shape.kind, "shape inferred from default");
            adopt_shape(node, shape);
        }
        return;
    }
    match default {
        Value::Object(entries) => refine_object(node, entries),
        Value::Array(elements) => refine_array(node, elements),
        _ => {}
    }
}

/// Synthesize a schema describing the literal `value`.
fn shape_of(value: &Value) -> Option<SchemaNode> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(SchemaNode::of_kind(Kind::Boolean)),
        Value::Number(_) => Some(SchemaNode::of_kind(Kind::Number)),
        Value::String(_) => Some(SchemaNode::of_kind(Kind::String)),
        Value::Array(elements) => Some(SchemaNode {
            items: elements.first().and_then(shape_of).map(Box::new),
            ..SchemaNode::of_kind(Kind::Array)
        }),
        Value::Object(entries) => {
            let properties: BTreeMap<String, SchemaNode> = entries
                .iter()
                .map(|(key, value)| (key.clone(), shape_of(value).unwrap_or_default()))
                .collect();
            Some(SchemaNode {
                required: Some(properties.keys().cloned().collect()),
                properties: Some(properties),
                ..SchemaNode::of_kind(Kind::Object)
            })
        }
    }
}

/// Copy the structural fields of `shape` onto `node`, keeping its
/// annotations and any constraints already written by rules.
fn adopt_shape(node: &mut SchemaNode, shape: SchemaNode) {
    node.kind = shape.kind;
    node.properties = shape.properties;
    node.required = shape.required;
    node.items = shape.items;
}

fn refine_object(node: &mut SchemaNode, entries: &Map<String, Value>) {
    if let Some(properties) = node.properties.as_mut() {
        for (key, property) in properties.iter_mut() {
            if let Some(value) = entries.get(key) {
                refine(property, value);
            }
        }
        return;
    }

    let Some(AdditionalProperties::Schema(value_schema)) = &node.additional_properties else {
        return;
    };
    if entries.is_empty() {
        return;
    }
    let properties: BTreeMap<String, SchemaNode> = entries
        .iter()
        .map(|(key, value)| {
            let mut property = value_schema.as_ref().clone();
            refine(&mut property, value);
            (key.clone(), property)
        })
        .collect();
    tracing::debug!(keys = properties.len(), "map keys inferred from default");
    node.required = Some(properties.keys().cloned().collect());
    node.properties = Some(properties);
}

fn refine_array(node: &mut SchemaNode, elements: &[Value]) {
    if let Some(slots) = node.prefix_items.as_mut() {
        for (slot, value) in slots.iter_mut().zip(elements) {
            refine(slot, value);
        }
    } else if let (Some(item), Some(first)) = (node.items.as_mut(), elements.first()) {
        refine(item, first);
    }
}
