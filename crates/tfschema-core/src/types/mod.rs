//! Type expressions and their conversion into schema nodes.
//!
//! A [`TypeExpression`] is read from the `type` attribute of a variable and
//! converted by a [`TypeRegistry`], which dispatches on the type keyword.

mod builtin;
mod registry;

pub use builtin::{
    AnyConverter, CollectionConverter, MapConverter, ObjectConverter, OptionalConverter,
    PrimitiveConverter, TupleConverter,
};
pub use registry::{TypeConverter, TypeRegistry};

use std::collections::HashSet;

use crate::error::ConvertError;
use crate::hcl::{Expression, ObjectKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpression {
    Primitive(PrimitiveType),
    Any,
    List(Box<TypeExpression>),
    Set(Box<TypeExpression>),
    Map(Box<TypeExpression>),
    Tuple(Vec<TypeExpression>),
    Object(Vec<ObjectField>),
    /// `optional(T)` or `optional(T, default)` inside an object type.
    Optional {
        inner: Box<TypeExpression>,
        default: Option<Expression>,
    },
    /// A keyword with no built-in meaning, resolved through the registry.
    Custom {
        keyword: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub ty: TypeExpression,
}

impl ObjectField {
    pub fn is_optional(&self) -> bool {
        matches!(self.ty, TypeExpression::Optional { .. })
    }
}

fn malformed(message: impl Into<String>) -> ConvertError {
    ConvertError::MalformedType {
        message: message.into(),
    }
}

impl TypeExpression {
    /// The keyword used to look up a converter.
    pub fn keyword(&self) -> &str {
        match self {
            TypeExpression::Primitive(PrimitiveType::String) => "string",
            TypeExpression::Primitive(PrimitiveType::Number) => "number",
            TypeExpression::Primitive(PrimitiveType::Bool) => "bool",
            TypeExpression::Any => "any",
            TypeExpression::List(_) => "list",
            TypeExpression::Set(_) => "set",
            TypeExpression::Map(_) => "map",
            TypeExpression::Tuple(_) => "tuple",
            TypeExpression::Object(_) => "object",
            TypeExpression::Optional { .. } => "optional",
            TypeExpression::Custom { keyword, .. } => keyword,
        }
    }

    pub fn from_expression(expr: &Expression) -> Result<Self, ConvertError> {
        match expr {
            Expression::Parenthesized(inner) => Self::from_expression(inner),
            Expression::Variable(name) => match name.as_str() {
                "string" => Ok(TypeExpression::Primitive(PrimitiveType::String)),
                "number" => Ok(TypeExpression::Primitive(PrimitiveType::Number)),
                "bool" => Ok(TypeExpression::Primitive(PrimitiveType::Bool)),
                "any" => Ok(TypeExpression::Any),
                keyword @ ("list" | "set" | "map" | "tuple" | "object" | "optional") => Err(
                    malformed(format!("`{keyword}` requires a type argument")),
                ),
                keyword => Ok(TypeExpression::Custom {
                    keyword: keyword.to_string(),
                    args: Vec::new(),
                }),
            },
            Expression::FunctionCall(call) => {
                let name = call.name.as_str();
                let args = call.args.as_slice();
                match name {
                    "list" | "set" | "map" => {
                        let [element] = args else {
                            return Err(malformed(format!(
                                "`{name}` takes exactly one element type, got {}",
                                args.len()
                            )));
                        };
                        let element = Box::new(Self::from_expression(element)?);
                        Ok(match name {
                            "list" => TypeExpression::List(element),
                            "set" => TypeExpression::Set(element),
                            _ => TypeExpression::Map(element),
                        })
                    }
                    "tuple" => match args {
                        [Expression::Tuple(elements)] => elements
                            .iter()
                            .map(Self::from_expression)
                            .collect::<Result<Vec<_>, _>>()
                            .map(TypeExpression::Tuple),
                        _ => Err(malformed("`tuple` takes a single list of element types")),
                    },
                    "object" => match args {
                        [Expression::Object(items)] => {
                            let mut seen = HashSet::new();
                            let mut fields = Vec::with_capacity(items.len());
                            for item in items {
                                let name = object_field_name(&item.key)?;
                                if !seen.insert(name.clone()) {
                                    return Err(malformed(format!(
                                        "object attribute `{name}` is declared more than once"
                                    )));
                                }
                                fields.push(ObjectField {
                                    name,
                                    ty: Self::from_expression(&item.value)?,
                                });
                            }
                            Ok(TypeExpression::Object(fields))
                        }
                        _ => Err(malformed(
                            "`object` takes a single object of attribute types",
                        )),
                    },
                    "optional" => match args {
                        [inner] => Ok(TypeExpression::Optional {
                            inner: Box::new(Self::from_expression(inner)?),
                            default: None,
                        }),
                        [inner, default] => Ok(TypeExpression::Optional {
                            inner: Box::new(Self::from_expression(inner)?),
                            default: Some(default.clone()),
                        }),
                        _ => Err(malformed(format!(
                            "`optional` takes a type and an optional default, got {} arguments",
                            args.len()
                        ))),
                    },
                    "string" | "number" | "bool" | "any" => Err(malformed(format!(
                        "`{name}` does not take arguments"
                    ))),
                    keyword => Ok(TypeExpression::Custom {
                        keyword: keyword.to_string(),
                        args: args.to_vec(),
                    }),
                }
            }
            other => Err(malformed(format!("`{other}` is not a type expression"))),
        }
    }
}

fn object_field_name(key: &ObjectKey) -> Result<String, ConvertError> {
    match key {
        ObjectKey::Identifier(name) => Ok(name.clone()),
        ObjectKey::Expression(Expression::String(name)) => Ok(name.clone()),
        ObjectKey::Expression(other) => Err(malformed(format!(
            "object attribute name `{other}` must be an identifier or string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcl::{parse_expression, Source};
    use pretty_assertions::assert_eq;

    fn parse_type(text: &str) -> Result<TypeExpression, ConvertError> {
        TypeExpression::from_expression(&parse_expression(&Source::new("type.tf", text)).unwrap())
    }

    #[test]
    fn test_primitives_and_collections() {
        assert_eq!(
            parse_type("list(map(string))").unwrap(),
            TypeExpression::List(Box::new(TypeExpression::Map(Box::new(
                TypeExpression::Primitive(PrimitiveType::String)
            ))))
        );
        assert_eq!(
            parse_type("set(bool)").unwrap(),
            TypeExpression::Set(Box::new(TypeExpression::Primitive(PrimitiveType::Bool)))
        );
        assert_eq!(parse_type("any").unwrap(), TypeExpression::Any);
    }

    #[test]
    fn test_object_with_optional_fields() {
        let ty = parse_type(r#"object({ name = string, port = optional(number, 8080) })"#).unwrap();
        let TypeExpression::Object(fields) = ty else {
            panic!("expected object type");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "name");
        assert!(!fields[0].is_optional());
        assert_eq!(fields[1].name, "port");
        assert!(fields[1].is_optional());
        let TypeExpression::Optional { default, .. } = &fields[1].ty else {
            panic!("expected optional");
        };
        assert!(default.is_some());
    }

    #[test]
    fn test_tuple() {
        assert_eq!(
            parse_type("tuple([string, number])").unwrap(),
            TypeExpression::Tuple(vec![
                TypeExpression::Primitive(PrimitiveType::String),
                TypeExpression::Primitive(PrimitiveType::Number),
            ])
        );
    }

    #[test]
    fn test_unknown_keyword_becomes_custom() {
        let ty = parse_type("duration(\"1h\")").unwrap();
        assert_eq!(ty.keyword(), "duration");
        assert!(matches!(ty, TypeExpression::Custom { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn test_malformed_types() {
        assert!(matches!(
            parse_type("list(string, number)"),
            Err(ConvertError::MalformedType { .. })
        ));
        assert!(matches!(parse_type("map"), Err(ConvertError::MalformedType { .. })));
        assert!(matches!(
            parse_type("object({ a = string, a = number })"),
            Err(ConvertError::MalformedType { .. })
        ));
        assert!(matches!(parse_type("\"string\""), Err(ConvertError::MalformedType { .. })));
    }
}
