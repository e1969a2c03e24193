use serde_json::{Number, Value};

use crate::schema::{Kind, SchemaNode};

/// Numeric bounds and literal alternatives from comparison conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericRange {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub values: Option<Vec<Value>>,
}

/// A validation constraint extracted from a condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Inclusive length bounds; written to the length, item or property
    /// count keywords depending on the target's kind.
    Length { min: Option<i64>, max: Option<i64> },
    Range(NumericRange),
    Regex { pattern: String },
    Enum { values: Vec<Value> },
}

fn overwrite<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        field.clone_from(value);
    }
}

impl Rule {
    /// Write this rule's fields onto `node`, replacing earlier values of the
    /// same fields. Fields the rule does not set are left alone.
    pub fn apply(&self, node: &mut SchemaNode) {
        match self {
            Rule::Length { min, max } => {
                let (min_field, max_field) = match node.kind {
                    Some(Kind::String) => (&mut node.min_length, &mut node.max_length),
                    Some(Kind::Array) => (&mut node.min_items, &mut node.max_items),
                    Some(Kind::Object) => (&mut node.min_properties, &mut node.max_properties),
                    other => {
                        tracing::warn!(
                            kind = ?other,
                            "length rule ignored: target is not a string, array or object"
                        );
                        return;
                    }
                };
                overwrite(min_field, min);
                overwrite(max_field, max);
            }
            Rule::Range(range) => {
                overwrite(&mut node.minimum, &range.minimum);
                overwrite(&mut node.maximum, &range.maximum);
                overwrite(&mut node.exclusive_minimum, &range.exclusive_minimum);
                overwrite(&mut node.exclusive_maximum, &range.exclusive_maximum);
                overwrite(&mut node.enum_values, &range.values);
            }
            Rule::Regex { pattern } => node.pattern = Some(pattern.clone()),
            Rule::Enum { values } => node.enum_values = Some(values.clone()),
        }
    }
}
