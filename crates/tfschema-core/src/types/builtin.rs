//! Converters for the built-in type keywords.

use std::collections::BTreeMap;

use crate::error::ConvertError;
use crate::schema::{AdditionalProperties, Kind, SchemaNode};
use crate::types::{PrimitiveType, TypeConverter, TypeExpression, TypeRegistry};

fn mismatch(converter: &str, ty: &TypeExpression) -> ConvertError {
    ConvertError::MalformedType {
        message: format!("{converter} cannot convert `{}` types", ty.keyword()),
    }
}

/// `string`, `number`, `bool` map to the matching scalar kind.
pub struct PrimitiveConverter;

impl TypeConverter for PrimitiveConverter {
    fn convert(&self, ty: &TypeExpression, _: &TypeRegistry) -> Result<SchemaNode, ConvertError> {
        let TypeExpression::Primitive(primitive) = ty else {
            return Err(mismatch("primitive converter", ty));
        };
        Ok(SchemaNode::of_kind(match primitive {
            PrimitiveType::String => Kind::String,
            PrimitiveType::Number => Kind::Number,
            PrimitiveType::Bool => Kind::Boolean,
        }))
    }
}

/// `any` is the unconstrained schema.
pub struct AnyConverter;

impl TypeConverter for AnyConverter {
    fn convert(&self, _: &TypeExpression, _: &TypeRegistry) -> Result<SchemaNode, ConvertError> {
        Ok(SchemaNode::default())
    }
}

/// `list(T)` and `set(T)`: a homogeneous array, with unique items for sets.
pub struct CollectionConverter {
    pub unique: bool,
}

impl TypeConverter for CollectionConverter {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        let (TypeExpression::List(element) | TypeExpression::Set(element)) = ty else {
            return Err(mismatch("collection converter", ty));
        };
        Ok(SchemaNode {
            items: Some(Box::new(registry.convert(element)?)),
            unique_items: self.unique.then_some(true),
            ..SchemaNode::of_kind(Kind::Array)
        })
    }
}

/// `map(T)`: an object whose every value matches `T`.
pub struct MapConverter;

impl TypeConverter for MapConverter {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        let TypeExpression::Map(element) = ty else {
            return Err(mismatch("map converter", ty));
        };
        Ok(SchemaNode {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(
                registry.convert(element)?,
            ))),
            ..SchemaNode::object()
        })
    }
}

/// `tuple([A, B, ...])`: fixed-length positional items.
pub struct TupleConverter;

impl TypeConverter for TupleConverter {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        let TypeExpression::Tuple(elements) = ty else {
            return Err(mismatch("tuple converter", ty));
        };
        let slots = elements
            .iter()
            .map(|element| registry.convert(element))
            .collect::<Result<Vec<_>, _>>()?;
        let arity = slots.len() as i64;
        Ok(SchemaNode {
            prefix_items: Some(slots),
            min_items: Some(arity),
            max_items: Some(arity),
            ..SchemaNode::of_kind(Kind::Array)
        })
    }
}

/// `object({...})`: one property per attribute; non-optional attributes are
/// required. Extra attributes are allowed.
pub struct ObjectConverter;

impl TypeConverter for ObjectConverter {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        let TypeExpression::Object(fields) = ty else {
            return Err(mismatch("object converter", ty));
        };
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        for field in fields {
            properties.insert(field.name.clone(), registry.convert(&field.ty)?);
            if !field.is_optional() {
                required.push(field.name.clone());
            }
        }
        required.sort();
        Ok(SchemaNode {
            properties: Some(properties),
            required: Some(required),
            additional_properties: Some(AdditionalProperties::Allowed(true)),
            ..SchemaNode::of_kind(Kind::Object)
        })
    }
}

/// `optional(T[, default])` converts as `T`. The default is not embedded.
pub struct OptionalConverter;

impl TypeConverter for OptionalConverter {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        let TypeExpression::Optional { inner, .. } = ty else {
            return Err(mismatch("optional converter", ty));
        };
        registry.convert(inner)
    }
}
