use std::collections::HashMap;

use crate::error::ConvertError;
use crate::schema::SchemaNode;
use crate::types::builtin::{
    AnyConverter, CollectionConverter, MapConverter, ObjectConverter, OptionalConverter,
    PrimitiveConverter, TupleConverter,
};
use crate::types::TypeExpression;

/// Converts one family of type expressions into a schema node.
///
/// Converters receive the registry so that nested element types are
/// dispatched through it as well.
pub trait TypeConverter: Send + Sync {
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError>;
}

impl<F> TypeConverter for F
where
    F: Fn(&TypeExpression, &TypeRegistry) -> Result<SchemaNode, ConvertError> + Send + Sync,
{
    fn convert(
        &self,
        ty: &TypeExpression,
        registry: &TypeRegistry,
    ) -> Result<SchemaNode, ConvertError> {
        self(ty, registry)
    }
}

/// Keyword-indexed table of type converters.
///
/// Populate it before compilation starts; compilation only reads from it.
#[derive(Default)]
pub struct TypeRegistry {
    converters: HashMap<String, Box<dyn TypeConverter>>,
}

impl TypeRegistry {
    /// A registry with no converters. Primitives still convert.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register("string", PrimitiveConverter)
            .register("number", PrimitiveConverter)
            .register("bool", PrimitiveConverter)
            .register("any", AnyConverter)
            .register("list", CollectionConverter { unique: false })
            .register("set", CollectionConverter { unique: true })
            .register("map", MapConverter)
            .register("tuple", TupleConverter)
            .register("object", ObjectConverter)
            .register("optional", OptionalConverter);
        registry
    }

    /// Register `converter` for `keyword`, replacing any previous one.
    pub fn register(
        &mut self,
        keyword: impl Into<String>,
        converter: impl TypeConverter + 'static,
    ) -> &mut Self {
        self.converters.insert(keyword.into(), Box::new(converter));
        self
    }

    pub fn convert(&self, ty: &TypeExpression) -> Result<SchemaNode, ConvertError> {
        let keyword = ty.keyword();
        if let Some(converter) = self.converters.get(keyword) {
            return converter.convert(ty, self);
        }
        match ty {
            TypeExpression::Primitive(_) => PrimitiveConverter.convert(ty, self),
            _ => Err(ConvertError::UnsupportedType {
                keyword: keyword.to_string(),
            }),
        }
    }
}
