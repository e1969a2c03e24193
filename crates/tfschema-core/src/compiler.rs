//! Per-variable compilation and root document assembly.

use std::collections::{BTreeMap, HashSet};

use crate::attributes::{default_appliers, AttributeApplier};
use crate::config::{ConvertOptions, UnmatchedConditions};
use crate::error::ConvertError;
use crate::inference::refine;
use crate::navigator::locate;
use crate::schema::{AdditionalProperties, Kind, SchemaNode};
use crate::types::TypeRegistry;
use crate::validation::{MatchOutcome, MatcherRegistry};
use crate::variables::{ValidationBlock, VariableDecl};

/// Compiles variable declarations into JSON Schema.
///
/// The registries are fixed at construction and only read during
/// compilation, so one compiler can be reused across documents.
pub struct Compiler {
    options: ConvertOptions,
    types: TypeRegistry,
    matchers: MatcherRegistry,
    appliers: Vec<Box<dyn AttributeApplier>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Compiler {
    /// A compiler with the built-in type converters, matchers and appliers.
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_registries(
            options,
            TypeRegistry::with_defaults(),
            MatcherRegistry::with_defaults(),
            default_appliers(),
        )
    }

    pub fn with_registries(
        options: ConvertOptions,
        types: TypeRegistry,
        matchers: MatcherRegistry,
        appliers: Vec<Box<dyn AttributeApplier>>,
    ) -> Self {
        Self {
            options,
            types,
            matchers,
            appliers,
        }
    }

    /// Build the root schema: one property per variable, with every variable
    /// lacking a default listed in `required`.
    pub fn compile_document(&self, variables: &[VariableDecl]) -> Result<SchemaNode, ConvertError> {
        let mut seen = HashSet::new();
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();

        for decl in variables {
            if !seen.insert(decl.name.as_str()) {
                return Err(ConvertError::DuplicateVariable {
                    name: decl.name.clone(),
                });
            }
            properties.insert(decl.name.clone(), self.compile_variable(decl)?);
            if !decl.has_default() {
                required.push(decl.name.clone());
            }
        }
        required.sort();

        tracing::debug!(
            variables = properties.len(),
            required = required.len(),
            "document compiled"
        );
        Ok(SchemaNode {
            schema: Some(self.options.schema_uri.clone()),
            properties: Some(properties),
            required: Some(required),
            additional_properties: Some(AdditionalProperties::Allowed(true)),
            ..SchemaNode::of_kind(Kind::Object)
        })
    }

    /// Compile one variable: type conversion, attributes, validation rules,
    /// then inference from the default.
    pub fn compile_variable(&self, decl: &VariableDecl) -> Result<SchemaNode, ConvertError> {
        self.compile_variable_inner(decl)
            .map_err(|err| err.in_variable(&decl.name))
    }

    fn compile_variable_inner(&self, decl: &VariableDecl) -> Result<SchemaNode, ConvertError> {
        let mut node = match &decl.type_expr {
            Some(ty) => self.types.convert(ty)?,
            None => SchemaNode::default(),
        };

        for applier in &self.appliers {
            applier.apply(decl, &mut node, &self.options);
        }

        for (index, validation) in decl.validations.iter().enumerate() {
            self.apply_validation(decl, &mut node, index + 1, validation)?;
        }

        if self.options.infer_from_defaults {
            if let Some(default) = &decl.default {
                refine(&mut node, default);
            }
        }
        Ok(node)
    }

    /// `block` is the 1-based position of the validation block in the
    /// declaration.
    fn apply_validation(
        &self,
        decl: &VariableDecl,
        node: &mut SchemaNode,
        block: usize,
        validation: &ValidationBlock,
    ) -> Result<(), ConvertError> {
        let outcome = self
            .matchers
            .match_condition(&validation.condition, &decl.name)
            .map_err(|err| ConvertError::MalformedValidation {
                block,
                message: err.message,
            })?;

        match outcome {
            MatchOutcome::Matched(scoped) => {
                let target = locate(node, &scoped.path)?;
                scoped.rule.apply(target);
                tracing::debug!(
                    variable = %decl.name,
                    block,
                    path = %scoped.path,
                    "validation rule applied"
                );
                Ok(())
            }
            MatchOutcome::NoMatch => match self.options.unmatched_conditions {
                UnmatchedConditions::Ignore => {
                    tracing::debug!(
                        variable = %decl.name,
                        block,
                        condition = %validation.condition,
                        "no rule recognized in validation condition"
                    );
                    Ok(())
                }
                UnmatchedConditions::Warn => {
                    tracing::warn!(
                        variable = %decl.name,
                        block,
                        condition = %validation.condition,
                        "no rule recognized in validation condition"
                    );
                    Ok(())
                }
                UnmatchedConditions::Error => Err(ConvertError::UnrecognizedCondition { block }),
            },
        }
    }
}
