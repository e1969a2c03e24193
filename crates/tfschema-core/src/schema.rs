//! The JSON Schema tree produced for each variable.
//!
//! `SchemaNode` is a typed view of the subset of JSON Schema this compiler
//! emits. Every field is optional and skipped when unset, so a freshly
//! defaulted node serializes as `{}` (the unconstrained schema).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};

/// Title given to the outer node of a nullable wrapper.
pub const NULLABLE_TITLE: &str = "Select a type";

/// The `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Null,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `additionalProperties` is either a boolean or the schema of every extra value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(Value::Null)` serializes as an explicit `"default": null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_items: Option<Vec<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Non-standard extension marking secret inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,
}

impl SchemaNode {
    pub fn of_kind(kind: Kind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// An object node with no declared properties and an empty `required` set.
    pub fn object() -> Self {
        Self {
            kind: Some(Kind::Object),
            required: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Whether the node constrains the shape of a value at all.
    ///
    /// Annotations (`title`, `description`, `default`, `sensitive`) and scalar
    /// constraints written by rules do not count as shape.
    pub fn has_shape(&self) -> bool {
        self.kind.is_some()
            || self.any_of.is_some()
            || self.properties.is_some()
            || self.additional_properties.is_some()
            || self.items.is_some()
            || self.prefix_items.is_some()
    }

    /// Position of the non-null variant when this node is a nullable wrapper.
    fn nullable_variant_index(&self) -> Option<usize> {
        let variants = self.any_of.as_ref()?;
        if self.kind.is_some() || variants.len() != 2 {
            return None;
        }
        match (variants[0].kind, variants[1].kind) {
            (Some(Kind::Null), Some(Kind::Null)) => None,
            (Some(Kind::Null), _) => Some(1),
            (_, Some(Kind::Null)) => Some(0),
            _ => None,
        }
    }

    /// The node describing non-null values: the wrapped variant of a nullable
    /// wrapper, or `self` otherwise.
    pub fn value_variant(&self) -> &SchemaNode {
        match (self.nullable_variant_index(), &self.any_of) {
            (Some(index), Some(variants)) => &variants[index],
            _ => self,
        }
    }

    pub fn value_variant_mut(&mut self) -> &mut SchemaNode {
        let Some(index) = self.nullable_variant_index() else {
            return self;
        };
        match self.any_of {
            Some(ref mut variants) => &mut variants[index],
            None => self,
        }
    }

    /// Serialize to a `serde_json::Value`.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
