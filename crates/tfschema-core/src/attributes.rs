//! Non-validation attributes of a variable written onto its schema.

use crate::config::ConvertOptions;
use crate::schema::{Kind, SchemaNode, NULLABLE_TITLE};
use crate::variables::VariableDecl;

/// Writes one attribute of a declaration onto the variable's schema node.
///
/// Appliers run in order after type conversion and before validation rules.
pub trait AttributeApplier: Send + Sync {
    fn apply(&self, decl: &VariableDecl, node: &mut SchemaNode, options: &ConvertOptions);
}

/// `description` → `description`.
pub struct DescriptionApplier;

impl AttributeApplier for DescriptionApplier {
    fn apply(&self, decl: &VariableDecl, node: &mut SchemaNode, _: &ConvertOptions) {
        if let Some(description) = &decl.description {
            node.description = Some(description.clone());
        }
    }
}

/// `default` → `default`, unless embedding is turned off.
pub struct DefaultApplier;

impl AttributeApplier for DefaultApplier {
    fn apply(&self, decl: &VariableDecl, node: &mut SchemaNode, options: &ConvertOptions) {
        if !options.embed_defaults {
            return;
        }
        if let Some(default) = &decl.default {
            node.default = Some(default.clone());
        }
    }
}

/// `sensitive = true` → `"sensitive": true`.
pub struct SensitiveApplier;

impl AttributeApplier for SensitiveApplier {
    fn apply(&self, decl: &VariableDecl, node: &mut SchemaNode, _: &ConvertOptions) {
        if decl.sensitive == Some(true) {
            node.sensitive = Some(true);
        }
    }
}

/// `nullable = true` on a typed variable wraps the node in
/// `anyOf: [null, <node>]`.
///
/// Annotations (`description`, `default`, `sensitive`) move to the wrapper;
/// each variant is titled with its kind. Nodes without a `type` already
/// admit null and are left alone.
pub struct NullableApplier;

impl AttributeApplier for NullableApplier {
    fn apply(&self, decl: &VariableDecl, node: &mut SchemaNode, _: &ConvertOptions) {
        if decl.nullable != Some(true) {
            return;
        }
        let Some(kind) = node.kind else {
            return;
        };

        let mut inner = std::mem::take(node);
        let wrapper = SchemaNode {
            title: Some(NULLABLE_TITLE.to_string()),
            description: inner.description.take(),
            default: inner.default.take(),
            sensitive: inner.sensitive.take(),
            any_of: Some(vec![
                SchemaNode {
                    title: Some(Kind::Null.name().to_string()),
                    ..SchemaNode::of_kind(Kind::Null)
                },
                SchemaNode {
                    title: Some(kind.name().to_string()),
                    ..inner
                },
            ]),
            ..SchemaNode::default()
        };
        *node = wrapper;
    }
}

/// Description, default, sensitive, then nullable (which must come last so
/// the wrapper can collect the others).
pub fn default_appliers() -> Vec<Box<dyn AttributeApplier>> {
    vec![
        Box::new(DescriptionApplier),
        Box::new(DefaultApplier),
        Box::new(SensitiveApplier),
        Box::new(NullableApplier),
    ]
}
