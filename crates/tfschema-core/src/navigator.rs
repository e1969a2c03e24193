//! Locating the schema node a rule's path points at.

use crate::error::ConvertError;
use crate::schema::{AdditionalProperties, Kind, SchemaNode};
use crate::validation::{Path, PathSegment};

/// Descend from `root` along `path` and return the node it designates.
///
/// Nullable wrappers are transparent at every level: each step, including
/// the root, continues from the wrapper's non-null variant.
pub fn locate<'a>(root: &'a mut SchemaNode, path: &Path) -> Result<&'a mut SchemaNode, ConvertError> {
    let mut node = root.value_variant_mut();
    for segment in path.segments() {
        node = step(node, segment, path)?.value_variant_mut();
    }
    Ok(node)
}

fn step<'a>(
    node: &'a mut SchemaNode,
    segment: &PathSegment,
    path: &Path,
) -> Result<&'a mut SchemaNode, ConvertError> {
    match segment {
        PathSegment::Name(name) => node
            .properties
            .as_mut()
            .and_then(|properties| properties.get_mut(name))
            .ok_or_else(|| ConvertError::PathNotFound {
                path: path.to_string(),
                segment: name.clone(),
            }),
        PathSegment::Wildcard => {
            if node.prefix_items.is_some() {
                return Err(ConvertError::InvalidWildcardTarget {
                    path: path.to_string(),
                    reason: "a tuple has a separate schema for each position".to_string(),
                });
            }
            let kind = node.kind;
            match (&mut node.additional_properties, &mut node.items) {
                (Some(AdditionalProperties::Schema(value)), _) => Ok(value.as_mut()),
                (_, Some(item)) => Ok(item.as_mut()),
                _ => Err(ConvertError::InvalidWildcardTarget {
                    path: path.to_string(),
                    reason: format!(
                        "{} node has no shared element schema",
                        kind.map_or("untyped", Kind::name)
                    ),
                }),
            }
        }
        PathSegment::Index(index) => match (&mut node.prefix_items, &mut node.items) {
            (Some(slots), _) => {
                let arity = slots.len();
                slots.get_mut(*index).ok_or(ConvertError::IndexOutOfRange {
                    path: path.to_string(),
                    index: *index,
                    arity,
                })
            }
            (None, Some(item)) => Ok(item.as_mut()),
            _ => Err(ConvertError::InvalidIndexTarget {
                path: path.to_string(),
                index: *index,
            }),
        },
    }
}
