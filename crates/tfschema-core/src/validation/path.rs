//! Symbolic paths from a variable's schema root to the node a rule targets.

use std::fmt;

use crate::hcl::{Expression, TraversalOp};
use crate::validation::syntax::children;

/// Namespace through which a module refers to its own variables.
pub const VAR_NAMESPACE: &str = "var";
/// Self-reference alias.
pub const SELF_ALIAS: &str = "self";
/// Element alias of `for_each` constructs.
pub const EACH_ALIAS: &str = "each";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Name(String),
    /// Every value of a map or every element of an array.
    Wildcard,
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(mut self, segment: PathSegment) -> Self {
        self.0.push(segment);
        self
    }

    pub fn join(mut self, other: &Path) -> Self {
        self.0.extend(other.0.iter().cloned());
        self
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Name(name) if i == 0 => f.write_str(name)?,
                PathSegment::Name(name) => write!(f, ".{name}")?,
                PathSegment::Wildcard => f.write_str("[*]")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn segment(op: &TraversalOp) -> PathSegment {
    match op {
        TraversalOp::GetAttr(name) => PathSegment::Name(name.clone()),
        TraversalOp::LegacyIndex(index) => PathSegment::Index(*index as usize),
        TraversalOp::Index(Expression::Number(n)) => match n.as_u64() {
            Some(index) => PathSegment::Index(index as usize),
            None => PathSegment::Wildcard,
        },
        TraversalOp::Index(_) | TraversalOp::Splat => PathSegment::Wildcard,
    }
}

fn segments(ops: &[TraversalOp]) -> Path {
    Path(ops.iter().map(segment).collect())
}

fn is_alias(name: &str, variable: &str) -> bool {
    name == variable || name == SELF_ALIAS || name == EACH_ALIAS
}

/// The path denoted by `expr` when it is itself a reference to `variable`:
/// `var.<variable>...`, `self...`, `each...` or `<variable>...` for a loop
/// variable. Parentheses are ignored.
pub fn reference_path(expr: &Expression, variable: &str) -> Option<Path> {
    match expr.unparenthesized() {
        Expression::Variable(name) if is_alias(name, variable) => Some(Path::root()),
        Expression::Traversal(traversal) => {
            let Expression::Variable(root) = &traversal.expr else {
                return None;
            };
            let ops = traversal.operators.as_slice();
            if is_alias(root, variable) {
                return Some(segments(ops));
            }
            match ops {
                [TraversalOp::GetAttr(name), rest @ ..]
                    if root == VAR_NAMESPACE && name == variable =>
                {
                    Some(segments(rest))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Whether `expr` is itself a reference to `variable` (through `var`,
/// `self`, `each` or the loop variable), as opposed to an expression that
/// merely contains one.
pub fn is_reference(expr: &Expression, variable: &str) -> bool {
    reference_path(expr, variable).is_some()
}

/// Whether `expr` is a traversal containing a splat (`[*]` or `.*`). Such a
/// traversal already denotes a sequence of elements.
pub fn splats(expr: &Expression) -> bool {
    match expr.unparenthesized() {
        Expression::Traversal(traversal) => traversal
            .operators
            .iter()
            .any(|op| matches!(op, TraversalOp::Splat)),
        _ => false,
    }
}

/// Find the first reference to `variable` in `expr`, in source order, and
/// convert its remaining traversal steps into a path.
///
/// `None` means `expr` does not mention the variable; callers treat that as
/// the variable's root.
pub fn resolve(expr: &Expression, variable: &str) -> Option<Path> {
    if let Some(path) = reference_path(expr, variable) {
        return Some(path);
    }
    children(expr)
        .into_iter()
        .find_map(|child| resolve(child, variable))
}
