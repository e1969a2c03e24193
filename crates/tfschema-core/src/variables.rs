//! Extraction of `variable` declarations from a parsed document.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::ConvertError;
use crate::hcl::{evaluate, Attribute, Block, Body, Expression};
use crate::types::TypeExpression;

/// A `variable "<name>" { ... }` block, with literal attributes evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub type_expr: Option<TypeExpression>,
    /// `Some(Value::Null)` for an explicit `default = null`.
    pub default: Option<Value>,
    pub description: Option<String>,
    pub sensitive: Option<bool>,
    pub nullable: Option<bool>,
    pub validations: Vec<ValidationBlock>,
}

impl VariableDecl {
    /// A declaration with only a name, as written by `variable "name" {}`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: None,
            default: None,
            description: None,
            sensitive: None,
            nullable: None,
            validations: Vec::new(),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationBlock {
    pub condition: Expression,
    pub error_message: Option<String>,
}

/// Collect every `variable` block of `body`, in source order.
pub fn extract_variables(body: &Body) -> Result<Vec<VariableDecl>, ConvertError> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();
    for block in body.blocks_of("variable") {
        let decl = declaration(block)?;
        if !seen.insert(decl.name.clone()) {
            return Err(ConvertError::DuplicateVariable { name: decl.name });
        }
        variables.push(decl);
    }
    Ok(variables)
}

fn declaration(block: &Block) -> Result<VariableDecl, ConvertError> {
    let [name] = block.labels.as_slice() else {
        return Err(ConvertError::MalformedDeclaration {
            message: format!(
                "variable block must have exactly one label, found {}",
                block.labels.len()
            ),
        });
    };

    let mut decl = VariableDecl::new(name.as_str());
    for attr in &block.body.attributes {
        match attr.name.as_str() {
            "type" => {
                decl.type_expr = Some(
                    TypeExpression::from_expression(&attr.expr)
                        .map_err(|err| err.in_variable(name))?,
                )
            }
            "default" => decl.default = Some(literal(attr, name)?),
            "description" => decl.description = Some(string_attribute(attr, name)?),
            "sensitive" => decl.sensitive = Some(bool_attribute(attr, name)?),
            "nullable" => decl.nullable = Some(bool_attribute(attr, name)?),
            other => tracing::debug!(variable = %name, attribute = other, "ignoring attribute"),
        }
    }

    for validation in block.body.blocks_of("validation") {
        let Some(condition) = validation.body.attribute("condition") else {
            tracing::debug!(
                variable = %name,
                "skipping validation block without a condition"
            );
            continue;
        };
        let error_message = validation
            .body
            .attribute("error_message")
            .map(|attr| match evaluate(&attr.expr) {
                Ok(Value::String(text)) => text,
                _ => attr.expr.to_string(),
            });
        decl.validations.push(ValidationBlock {
            condition: condition.expr.clone(),
            error_message,
        });
    }
    Ok(decl)
}

fn literal(attr: &Attribute, variable: &str) -> Result<Value, ConvertError> {
    evaluate(&attr.expr).map_err(|err| {
        ConvertError::InvalidAttribute {
            attribute: attr.name.clone(),
            message: err.to_string(),
        }
        .in_variable(variable)
    })
}

fn string_attribute(attr: &Attribute, variable: &str) -> Result<String, ConvertError> {
    match literal(attr, variable)? {
        Value::String(text) => Ok(text),
        other => Err(invalid_kind(attr, "a string", &other).in_variable(variable)),
    }
}

fn bool_attribute(attr: &Attribute, variable: &str) -> Result<bool, ConvertError> {
    match literal(attr, variable)? {
        Value::Bool(flag) => Ok(flag),
        other => Err(invalid_kind(attr, "a boolean", &other).in_variable(variable)),
    }
}

fn invalid_kind(attr: &Attribute, expected: &str, found: &Value) -> ConvertError {
    ConvertError::InvalidAttribute {
        attribute: attr.name.clone(),
        message: format!("expected {expected}, found `{found}`"),
    }
}
